//! # Upload API
//!
//! Accepts a multipart form with a `file` part and a `details` part holding
//! [`ReleaseDetails`] as JSON, stores the artifact, and records the release.
//!
//! When `details` comes first the artifact streams straight into the store
//! and any parts after `file` are left unread. When `file` comes first it is
//! spooled to a temporary file until `details` arrives. Either way the
//! metadata is validated before the artifact is written.

use ars_catalog::NewRelease;
use ars_core::{Release, ReleaseDetails};
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::{
    extract_multipart, field_stream, multipart_error, read_details, upload_error,
    upload_file_name, SpooledFile, UploaderIp, DETAILS_FIELD, FILE_FIELD,
};
use crate::state::AppState;

/// Multipart upload form, for the OpenAPI document only.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadAppForm {
    /// The artifact. Its file name becomes the last segment of the
    /// download URL.
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    /// Release metadata as a JSON document.
    details: ReleaseDetails,
}

/// Build the upload router. Authentication is layered on by the caller.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/admin/upload/app", post(upload_app))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// POST /admin/upload/app: upload a release artifact.
#[utoipa::path(
    post,
    path = "/admin/upload/app",
    request_body(content = UploadAppForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Release created", body = Release),
        (status = 400, description = "Invalid metadata or malformed form", body = crate::error::ErrorBody),
        (status = 401, description = "Missing or invalid credentials", body = crate::error::ErrorBody),
        (status = 413, description = "Upload exceeds the size limit", body = crate::error::ErrorBody),
        (status = 500, description = "Storage or database failure", body = crate::error::ErrorBody),
    ),
    security(("basic_auth" = [])),
    tag = "admin"
)]
pub async fn upload_app(
    State(state): State<AppState>,
    UploaderIp(uploader_ip): UploaderIp,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Release>, AppError> {
    let mut multipart = extract_multipart(multipart)?;
    let mut details: Option<ReleaseDetails> = None;
    let mut spooled: Option<SpooledFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FILE_FIELD) => {
                if spooled.is_some() {
                    return Err(duplicate(FILE_FIELD));
                }
                let file_name = upload_file_name(&field)?;
                match details.take() {
                    Some(details) => {
                        let upload = NewRelease {
                            details,
                            file_name,
                            uploader_ip,
                        };
                        let release = state
                            .catalog
                            .create_release(upload, field_stream(field))
                            .await
                            .map_err(upload_error)?;
                        return Ok(Json(release));
                    }
                    None => spooled = Some(SpooledFile::spool(file_name, field).await?),
                }
            }
            Some(DETAILS_FIELD) => {
                if details.is_some() {
                    return Err(duplicate(DETAILS_FIELD));
                }
                details = Some(read_details(field).await?);
            }
            other => {
                tracing::debug!(field = ?other, "ignoring unknown multipart field");
            }
        }
    }

    let details = details
        .ok_or_else(|| AppError::BadRequest(format!("missing `{DETAILS_FIELD}` field")))?;
    let spooled =
        spooled.ok_or_else(|| AppError::BadRequest(format!("missing `{FILE_FIELD}` field")))?;

    let upload = NewRelease {
        details,
        file_name: spooled.file_name.clone(),
        uploader_ip,
    };
    let release = state
        .catalog
        .create_release(upload, spooled.into_stream())
        .await?;
    Ok(Json(release))
}

fn duplicate(field: &str) -> AppError {
    AppError::BadRequest(format!("duplicate `{field}` field"))
}
