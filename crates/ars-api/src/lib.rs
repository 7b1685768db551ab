//! # ars-api — HTTP Service for the App Release Server
//!
//! ## API Surface
//!
//! | Route | Module | Auth |
//! |-------|--------|------|
//! | `POST /admin/upload/app` | [`routes::upload`] | Basic |
//! | `GET /apps/:app_name/latest` | [`routes::apps`] | none |
//! | `GET /apps/:app_name/:app_version/:app_build/:file_name` | [`routes::apps`] | none |
//! | `GET /openapi.json` | [`openapi`] | none |
//! | `GET /health/liveness`, `GET /health/readiness` | this module | none |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → [admin only: BasicAuth → body limit] → Handler
//! ```

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Only `/admin/*` sits behind Basic authentication.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        credentials: state.config.credentials.clone(),
    };

    let admin = routes::upload::router(state.config.max_upload_bytes)
        .layer(from_fn(auth::auth_middleware))
        .layer(axum::Extension(auth_config));

    let public = Router::new()
        .merge(routes::apps::router())
        .merge(openapi::router());

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new()
        .merge(admin)
        .merge(public)
        .with_state(state)
        .merge(health)
        .layer(middleware::tracing_layer::layer())
}

/// Liveness probe: always returns 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: returns 200 once the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
