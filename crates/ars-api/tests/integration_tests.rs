//! # Integration Tests for ars-api
//!
//! Drives the full router in-process: Basic auth on uploads, multipart
//! parsing, latest-release lookup, artifact download with accounting, error
//! bodies, health probes, and the OpenAPI document.

use std::path::PathBuf;
use std::sync::Arc;

use ars_api::config::{AppConfig, Credentials};
use ars_api::state::AppState;
use ars_catalog::{MemoryReleaseRepository, ReleaseCatalog};
use ars_core::ReleaseId;
use ars_storage::FsArtifactStore;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use base64::Engine;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const BOUNDARY: &str = "ars-test-boundary";

struct TestApp {
    _dir: tempfile::TempDir,
    root: PathBuf,
    repo: Arc<MemoryReleaseRepository>,
    router: axum::Router,
}

impl TestApp {
    fn new() -> Self {
        Self::build(|_| {})
    }

    fn build(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("artifacts");
        let mut config = AppConfig {
            port: 0,
            credentials: Credentials::new("admin", "secret"),
            storage_path: root.clone(),
            database_url: None,
            public_base_url: None,
            max_upload_bytes: 1024 * 1024,
        };
        customize(&mut config);

        let repo = Arc::new(MemoryReleaseRepository::new());
        let catalog = ReleaseCatalog::new(
            repo.clone(),
            Arc::new(FsArtifactStore::new(&root)),
            ars_api::bootstrap::download_urls(&config),
        );
        let router = ars_api::app(AppState::new(config, catalog));
        Self {
            _dir: dir,
            root,
            repo,
            router,
        }
    }

    async fn send(&self, request: Request<Body>) -> axum::http::Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> axum::http::Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn head(&self, uri: &str) -> axum::http::Response<Body> {
        self.send(
            Request::builder()
                .method("HEAD")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn upload(&self, body: Vec<u8>) -> axum::http::Response<Body> {
        self.send(upload_request(body, Some(&basic("admin", "secret"))))
            .await
    }
}

fn basic(user: &str, pass: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
}

fn upload_request(body: Vec<u8>, authorization: Option<&str>) -> Request<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri("/admin/upload/app")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(value) = authorization {
        req = req.header(header::AUTHORIZATION, value);
    }
    req.body(Body::from(body)).unwrap()
}

enum Part<'a> {
    File { name: &'a str, file_name: &'a str, data: &'a [u8] },
    Text { name: &'a str, value: &'a str },
}

fn multipart(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File { name, file_name, data } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn release_form(details: Value, file_name: &str, data: &[u8]) -> Vec<u8> {
    let details = details.to_string();
    multipart(&[
        Part::Text { name: "details", value: &details },
        Part::File { name: "file", file_name, data },
    ])
}

fn demo_details() -> Value {
    json!({
        "app_name": "demo",
        "app_version": "1.0",
        "app_build": "42",
        "git_commit": "deadbeef"
    })
}

async fn body_bytes(response: axum::http::Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_json(response: axum::http::Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

async fn assert_error(response: axum::http::Response<Body>, status: StatusCode, code: &str) {
    assert_eq!(response.status(), status);
    let body = body_json(response).await;
    assert_eq!(body["code"], code, "body: {body}");
    assert!(body["error"].is_string(), "body: {body}");
}

fn release_id(body: &Value) -> ReleaseId {
    ReleaseId::from_uuid(body["id"].as_str().unwrap().parse().unwrap())
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let app = TestApp::new();
    let response = app.get("/health/liveness").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let app = TestApp::new();
    let response = app.get("/health/readiness").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"ready");
}

// -- Upload Authentication ----------------------------------------------------

#[tokio::test]
async fn test_upload_without_credentials_is_401() {
    let app = TestApp::new();
    let body = release_form(demo_details(), "x.bin", &[1, 2]);
    let response = app.send(upload_request(body, None)).await;
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
    assert!(app.repo.is_empty());
    assert!(!app.root.exists());
}

#[tokio::test]
async fn test_upload_with_wrong_password_is_401() {
    let app = TestApp::new();
    let body = release_form(demo_details(), "x.bin", &[1, 2]);
    let response = app
        .send(upload_request(body, Some(&basic("admin", "wrong"))))
        .await;
    assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
    assert!(app.repo.is_empty());
}

#[tokio::test]
async fn test_public_routes_need_no_credentials() {
    let app = TestApp::new();
    app.upload(release_form(demo_details(), "x.bin", &[1])).await;
    assert_eq!(app.get("/apps/demo/latest").await.status(), StatusCode::OK);
    assert_eq!(
        app.get("/apps/demo/1.0/42/x.bin").await.status(),
        StatusCode::OK
    );
}

// -- End-to-end ---------------------------------------------------------------

#[tokio::test]
async fn test_upload_latest_download_scenario() {
    let app = TestApp::new();

    let response = app
        .upload(release_form(demo_details(), "x.bin", &[0x01, 0x02]))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    assert_eq!(created["app_name"], "demo");
    assert_eq!(created["app_version"], "1.0");
    assert_eq!(created["app_build"], "42");
    assert_eq!(created["git_commit"], "deadbeef");
    assert_eq!(created["main_file_name"], "x.bin");
    assert_eq!(created["download_count"], 0);
    let id = release_id(&created);

    let response = app.get("/apps/demo/latest").await;
    assert_eq!(response.status(), StatusCode::OK);
    let latest = body_json(response).await;
    assert_eq!(latest["app_name"], "demo");
    assert_eq!(latest["app_version"], "1.0");
    assert_eq!(latest["app_build"], "42");
    let url = latest["download_url"].as_str().unwrap();
    assert!(url.ends_with("/demo/1.0/42/x.bin"), "url: {url}");
    assert!(latest.get("target").is_none());

    let response = app.get(url).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"x.bin\""
    );
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "2");
    assert_eq!(body_bytes(response).await, vec![0x01, 0x02]);

    assert_eq!(app.repo.get(id).unwrap().download_count, 1);
}

#[tokio::test]
async fn test_details_part_may_follow_file_part() {
    let app = TestApp::new();
    let details = demo_details().to_string();
    let body = multipart(&[
        Part::File { name: "file", file_name: "x.bin", data: b"payload" },
        Part::Text { name: "details", value: &details },
    ]);
    let response = app.upload(body).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        std::fs::read(app.root.join("demo/1.0/42/x.bin")).unwrap(),
        b"payload"
    );
}

#[tokio::test]
async fn test_large_upload_streams_in_either_part_order() {
    let app = TestApp::new();
    let payload: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();

    let response = app
        .upload(release_form(demo_details(), "streamed.bin", &payload))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        std::fs::read(app.root.join("demo/1.0/42/streamed.bin")).unwrap(),
        payload
    );

    let details = json!({"app_name": "demo", "app_version": "1.0", "app_build": "43"})
        .to_string();
    let body = multipart(&[
        Part::File { name: "file", file_name: "spooled.bin", data: &payload },
        Part::Text { name: "details", value: &details },
    ]);
    assert_eq!(app.upload(body).await.status(), StatusCode::OK);
    assert_eq!(
        std::fs::read(app.root.join("demo/1.0/43/spooled.bin")).unwrap(),
        payload
    );
}

#[tokio::test]
async fn test_duplicate_file_part_is_400() {
    let app = TestApp::new();
    let details = demo_details().to_string();
    let body = multipart(&[
        Part::File { name: "file", file_name: "a.bin", data: &[1] },
        Part::File { name: "file", file_name: "b.bin", data: &[2] },
        Part::Text { name: "details", value: &details },
    ]);
    assert_error(app.upload(body).await, StatusCode::BAD_REQUEST, "BAD_REQUEST").await;
    assert!(app.repo.is_empty());
}

#[tokio::test]
async fn test_upload_records_forwarded_ip() {
    let app = TestApp::new();
    let mut request = upload_request(
        release_form(demo_details(), "x.bin", &[1]),
        Some(&basic("admin", "secret")),
    );
    request
        .headers_mut()
        .insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["uploader_ip"], "203.0.113.7");
}

#[tokio::test]
async fn test_upload_strips_directories_from_file_name() {
    let app = TestApp::new();
    let response = app
        .upload(release_form(demo_details(), "../../etc/evil.sh", &[1]))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["main_file_name"], "evil.sh");
    assert!(app.root.join("demo/1.0/42/evil.sh").is_file());
}

#[tokio::test]
async fn test_download_content_type_follows_extension() {
    let app = TestApp::new();
    app.upload(release_form(demo_details(), "notes.txt", b"hello"))
        .await;
    let response = app.get("/apps/demo/1.0/42/notes.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"), "{content_type}");
}

#[tokio::test]
async fn test_latest_follows_newest_upload() {
    let app = TestApp::new();
    app.upload(release_form(demo_details(), "x.bin", &[1])).await;
    let newer = json!({"app_name": "demo", "app_version": "1.1", "app_build": "43"});
    app.upload(release_form(newer, "y.bin", &[2])).await;

    let latest = body_json(app.get("/apps/demo/latest").await).await;
    assert_eq!(latest["app_version"], "1.1");
    assert_eq!(latest["app_build"], "43");
    assert!(latest["download_url"]
        .as_str()
        .unwrap()
        .ends_with("/demo/1.1/43/y.bin"));
}

#[tokio::test]
async fn test_latest_filters_by_target_and_arch() {
    let app = TestApp::new();
    let linux = json!({
        "app_name": "demo", "app_version": "1.0", "app_build": "1",
        "target": "linux", "arch": "x86_64"
    });
    let mac = json!({
        "app_name": "demo", "app_version": "1.0", "app_build": "1",
        "target": "darwin", "arch": "arm64"
    });
    app.upload(release_form(linux, "demo-linux.tar.gz", &[1])).await;
    app.upload(release_form(mac, "demo-mac.zip", &[2])).await;

    let latest = body_json(app.get("/apps/demo/latest?target=linux").await).await;
    assert_eq!(latest["target"], "linux");
    assert_eq!(latest["arch"], "x86_64");

    let latest = body_json(app.get("/apps/demo/latest").await).await;
    assert_eq!(latest["target"], "darwin");

    let response = app.get("/apps/demo/latest?target=windows").await;
    assert_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}

#[tokio::test]
async fn test_blank_distribution_fields_are_dropped() {
    let app = TestApp::new();
    let details = json!({
        "app_name": "demo", "app_version": "1.0", "app_build": "1",
        "target": "", "arch": ""
    });
    let created = body_json(app.upload(release_form(details, "x.bin", &[1])).await).await;
    assert!(created["target"].is_null());
    assert!(created["arch"].is_null());
}

#[tokio::test]
async fn test_absolute_download_url_with_public_base() {
    let app = TestApp::build(|cfg| {
        cfg.public_base_url = Some("https://dl.example.com/".parse().unwrap());
    });
    app.upload(release_form(demo_details(), "x.bin", &[1])).await;
    let latest = body_json(app.get("/apps/demo/latest").await).await;
    assert_eq!(
        latest["download_url"],
        "https://dl.example.com/apps/demo/1.0/42/x.bin"
    );
}

// -- Upload Validation --------------------------------------------------------

#[tokio::test]
async fn test_upload_missing_build_is_400_and_stores_nothing() {
    let app = TestApp::new();
    let details = json!({"app_name": "demo", "app_version": "1.0"});
    let response = app.upload(release_form(details, "x.bin", &[1])).await;
    assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
    assert!(app.repo.is_empty());
    assert!(!app.root.exists());
}

#[tokio::test]
async fn test_upload_traversal_coordinate_is_400() {
    let app = TestApp::new();
    let details = json!({"app_name": "..", "app_version": "1.0", "app_build": "1"});
    let response = app.upload(release_form(details, "x.bin", &[1])).await;
    assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
    assert!(!app.root.exists());
}

#[tokio::test]
async fn test_upload_malformed_details_is_400() {
    let app = TestApp::new();
    let body = multipart(&[
        Part::Text { name: "details", value: "{not json" },
        Part::File { name: "file", file_name: "x.bin", data: &[1] },
    ]);
    assert_error(app.upload(body).await, StatusCode::BAD_REQUEST, "BAD_REQUEST").await;
}

#[tokio::test]
async fn test_upload_missing_file_is_400() {
    let app = TestApp::new();
    let details = demo_details().to_string();
    let body = multipart(&[Part::Text { name: "details", value: &details }]);
    assert_error(app.upload(body).await, StatusCode::BAD_REQUEST, "BAD_REQUEST").await;
}

#[tokio::test]
async fn test_upload_missing_details_is_400() {
    let app = TestApp::new();
    let body = multipart(&[Part::File { name: "file", file_name: "x.bin", data: &[1] }]);
    assert_error(app.upload(body).await, StatusCode::BAD_REQUEST, "BAD_REQUEST").await;
}

#[tokio::test]
async fn test_upload_non_multipart_is_400() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("POST")
        .uri("/admin/upload/app")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, basic("admin", "secret"))
        .body(Body::from(demo_details().to_string()))
        .unwrap();
    assert_error(app.send(request).await, StatusCode::BAD_REQUEST, "BAD_REQUEST").await;
}

#[tokio::test]
async fn test_upload_over_limit_is_413() {
    let app = TestApp::build(|cfg| cfg.max_upload_bytes = 1024);
    let response = app
        .upload(release_form(demo_details(), "big.bin", &[0u8; 4096]))
        .await;
    assert_error(response, StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE").await;
    assert!(app.repo.is_empty());
}

#[tokio::test]
async fn test_oversized_reupload_keeps_previous_artifact() {
    let app = TestApp::build(|cfg| cfg.max_upload_bytes = 2048);
    let response = app
        .upload(release_form(demo_details(), "x.bin", b"good"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Metadata first: the artifact is already streaming into the store when
    // the limit is hit.
    let response = app
        .upload(release_form(demo_details(), "x.bin", &[0u8; 8192]))
        .await;
    assert_error(response, StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE").await;

    // File first: the limit is hit while spooling.
    let details = demo_details().to_string();
    let body = multipart(&[
        Part::File { name: "file", file_name: "x.bin", data: &[0u8; 8192] },
        Part::Text { name: "details", value: &details },
    ]);
    assert_error(app.upload(body).await, StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE").await;

    assert_eq!(app.repo.len(), 1);
    let response = app.get("/apps/demo/1.0/42/x.bin").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"good");
    let names: Vec<_> = std::fs::read_dir(app.root.join("demo/1.0/42"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("x.bin")]);
}

// -- Lookup Errors ------------------------------------------------------------

#[tokio::test]
async fn test_latest_unknown_app_is_404() {
    let app = TestApp::new();
    assert_error(
        app.get("/apps/nonexistent/latest").await,
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
    )
    .await;
}

#[tokio::test]
async fn test_download_unknown_artifact_is_404() {
    let app = TestApp::new();
    assert_error(
        app.get("/apps/demo/1.0/42/missing.bin").await,
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
    )
    .await;
}

#[tokio::test]
async fn test_download_with_row_but_deleted_file_is_404() {
    let app = TestApp::new();
    app.upload(release_form(demo_details(), "x.bin", &[1])).await;
    std::fs::remove_file(app.root.join("demo/1.0/42/x.bin")).unwrap();
    assert_error(
        app.get("/apps/demo/1.0/42/x.bin").await,
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
    )
    .await;
}

#[tokio::test]
async fn test_repeated_downloads_count_each_one() {
    let app = TestApp::new();
    let created = body_json(app.upload(release_form(demo_details(), "x.bin", &[1])).await).await;
    let id = release_id(&created);
    for _ in 0..5 {
        let response = app.get("/apps/demo/1.0/42/x.bin").await;
        assert_eq!(response.status(), StatusCode::OK);
        body_bytes(response).await;
    }
    assert_eq!(app.repo.get(id).unwrap().download_count, 5);
}

#[tokio::test]
async fn test_head_reports_headers_without_counting() {
    let app = TestApp::new();
    let created = body_json(
        app.upload(release_form(demo_details(), "x.bin", &[0x01, 0x02]))
            .await,
    )
    .await;
    let id = release_id(&created);

    for _ in 0..3 {
        let response = app.head("/apps/demo/1.0/42/x.bin").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "2");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"x.bin\""
        );
        assert!(body_bytes(response).await.is_empty());
    }
    assert_eq!(app.repo.get(id).unwrap().download_count, 0);

    let response = app.get("/apps/demo/1.0/42/x.bin").await;
    body_bytes(response).await;
    assert_eq!(app.repo.get(id).unwrap().download_count, 1);

    let response = app.head("/apps/demo/1.0/42/missing.bin").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_url_with_reserved_characters_is_fetchable() {
    let app = TestApp::new();
    let created = body_json(
        app.upload(release_form(demo_details(), "build#3 final.zip", b"zip"))
            .await,
    )
    .await;
    assert_eq!(created["main_file_name"], "build#3 final.zip");

    let latest = body_json(app.get("/apps/demo/latest").await).await;
    let url = latest["download_url"].as_str().unwrap();
    assert_eq!(url, "/apps/demo/1.0/42/build%233%20final.zip");

    let response = app.get(url).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"zip");
    assert_eq!(app.repo.get(release_id(&created)).unwrap().download_count, 1);
}

// -- OpenAPI ------------------------------------------------------------------

#[tokio::test]
async fn test_openapi_document_served() {
    let app = TestApp::new();
    let response = app.get("/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"]["/admin/upload/app"].is_object());
}
