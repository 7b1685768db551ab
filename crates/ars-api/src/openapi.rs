//! # OpenAPI Document
//!
//! Assembles the utoipa-documented routes into an OpenAPI spec served at
//! `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Assembled OpenAPI spec for the release server.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "App Release Server",
        version = "0.1.0",
        description = "Upload versioned application builds and distribute the latest release.",
        license(name = "MIT")
    ),
    paths(
        crate::routes::upload::upload_app,
        crate::routes::apps::latest_release,
        crate::routes::apps::download_artifact,
    ),
    components(schemas(
        ars_core::Release,
        ars_core::ReleaseId,
        ars_core::ReleaseDetails,
        ars_core::LatestRelease,
        crate::error::ErrorBody,
        crate::routes::upload::UploadAppForm,
    )),
    modifiers(&BasicAuthScheme),
    tags(
        (name = "admin", description = "Authenticated release uploads"),
        (name = "apps", description = "Public release lookup and download"),
    )
)]
pub struct ApiDoc;

struct BasicAuthScheme;

impl Modify for BasicAuthScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "basic_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
        );
    }
}

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: the generated OpenAPI document.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
