//! # Public Release API
//!
//! Latest-release lookup and artifact download. Neither route requires
//! credentials.

use ars_core::{Coordinates, LatestFilter, LatestRelease};
use axum::body::Body;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use crate::error::AppError;
use crate::state::AppState;

/// Build the public release router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/apps/:app_name/latest", get(latest_release))
        .route(
            "/apps/:app_name/:app_version/:app_build/:file_name",
            get(download_artifact),
        )
}

/// GET /apps/:app_name/latest: newest release of an application.
#[utoipa::path(
    get,
    path = "/apps/{app_name}/latest",
    params(
        ("app_name" = String, Path, description = "Application name"),
        ("target" = Option<String>, Query, description = "Only consider releases for this target"),
        ("arch" = Option<String>, Query, description = "Only consider releases for this architecture"),
    ),
    responses(
        (status = 200, description = "Latest release", body = LatestRelease),
        (status = 404, description = "No release for this application", body = crate::error::ErrorBody),
    ),
    tag = "apps"
)]
pub async fn latest_release(
    State(state): State<AppState>,
    Path(app_name): Path<String>,
    filter: Result<Query<LatestFilter>, QueryRejection>,
) -> Result<Json<LatestRelease>, AppError> {
    let Query(filter) = filter.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let release = state
        .catalog
        .get_latest(&app_name, &filter.normalized())
        .await?;
    Ok(Json(state.catalog.latest_view(&release)))
}

/// GET /apps/:app_name/:app_version/:app_build/:file_name: download an artifact.
#[utoipa::path(
    get,
    path = "/apps/{app_name}/{app_version}/{app_build}/{file_name}",
    params(
        ("app_name" = String, Path, description = "Application name"),
        ("app_version" = String, Path, description = "Application version"),
        ("app_build" = String, Path, description = "Application build"),
        ("file_name" = String, Path, description = "Artifact file name"),
    ),
    responses(
        (status = 200, description = "Artifact bytes; content type guessed from the file extension. HEAD returns the headers only and is not counted as a download"),
        (status = 400, description = "Invalid path segment", body = crate::error::ErrorBody),
        (status = 404, description = "Artifact not found", body = crate::error::ErrorBody),
    ),
    tag = "apps"
)]
pub async fn download_artifact(
    State(state): State<AppState>,
    method: Method,
    Path((app_name, app_version, app_build, file_name)): Path<(String, String, String, String)>,
) -> Result<Response, AppError> {
    let coordinates = Coordinates::new(app_name, app_version, app_build)?;
    let file_name = ars_core::sanitize_file_name(&file_name)?;

    // HEAD serves no bytes, so it must not count as a download.
    let (size, body) = if method == Method::HEAD {
        let artifact = state.catalog.open(&coordinates, &file_name).await?;
        (artifact.size, Body::empty())
    } else {
        let artifact = state.catalog.download(&coordinates, &file_name).await?;
        (artifact.size, Body::from_stream(artifact.stream))
    };

    let content_type = mime_guess::from_path(&file_name).first_or_octet_stream();

    Ok((
        [
            (header::CONTENT_TYPE, header_value(content_type.as_ref())),
            (header::CONTENT_LENGTH, HeaderValue::from(size)),
            (header::CONTENT_DISPOSITION, content_disposition(&file_name)),
        ],
        body,
    )
        .into_response())
}

fn header_value(value: &str) -> HeaderValue {
    HeaderValue::from_str(value)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}

/// `attachment; filename="..."`, or a bare `attachment` when the name cannot
/// be carried in a header value.
fn content_disposition(file_name: &str) -> HeaderValue {
    let escaped = file_name.replace('\\', "\\\\").replace('"', "\\\"");
    HeaderValue::from_str(&format!("attachment; filename=\"{escaped}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
