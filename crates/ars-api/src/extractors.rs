//! # Request Extractors
//!
//! Upload form parts and uploader address resolution. Everything here turns
//! transport-level input into plain values before the catalog sees it.
//!
//! Artifact parts are never buffered whole: they are either streamed into
//! the store as they arrive or spooled to an anonymous temporary file until
//! the metadata they depend on has been read.

use std::convert::Infallible;
use std::io::SeekFrom;
use std::net::SocketAddr;

use ars_catalog::CatalogError;
use ars_core::ReleaseDetails;
use ars_storage::{ByteStream, StorageError};
use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{ConnectInfo, FromRequestParts, Multipart};
use axum::http::request::Parts;
use axum::http::StatusCode;
use futures::StreamExt;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio_util::io::ReaderStream;

use crate::error::AppError;

/// Name of the multipart field carrying the artifact.
pub const FILE_FIELD: &str = "file";

/// Name of the multipart field carrying the JSON metadata.
pub const DETAILS_FIELD: &str = "details";

/// Map a multipart extraction rejection (wrong content type, unreadable
/// body) to [`AppError::BadRequest`].
pub fn extract_multipart(
    result: Result<Multipart, MultipartRejection>,
) -> Result<Multipart, AppError> {
    result.map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Map a multipart read failure: 413 when the body limit was hit, 400
/// otherwise.
pub fn multipart_error(err: MultipartError) -> AppError {
    classify_multipart(&err)
}

fn classify_multipart(err: &MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(format!("malformed multipart body: {}", err.body_text()))
    }
}

/// Map a failed `create_release` whose artifact was streamed from the
/// request.
///
/// A multipart failure inside the byte stream reaches the catalog as a
/// storage I/O error; it is a client error and is reported as one.
pub fn upload_error(err: CatalogError) -> AppError {
    if let CatalogError::Storage(StorageError::Io(io)) = &err {
        if let Some(multipart) = io
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<MultipartError>())
        {
            return classify_multipart(multipart);
        }
    }
    err.into()
}

/// File name from the `file` part's `Content-Disposition`, unsanitized.
pub fn upload_file_name(field: &Field<'_>) -> Result<String, AppError> {
    field
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| AppError::BadRequest(format!("`{FILE_FIELD}` field has no file name")))
}

/// Parse the `details` part as [`ReleaseDetails`] JSON.
pub async fn read_details(field: Field<'_>) -> Result<ReleaseDetails, AppError> {
    let text = field.text().await.map_err(multipart_error)?;
    serde_json::from_str(&text)
        .map_err(|e| AppError::BadRequest(format!("`{DETAILS_FIELD}` is not valid JSON: {e}")))
}

/// The bytes of a multipart part as they arrive.
pub fn field_stream(field: Field<'_>) -> ByteStream<'_> {
    Box::pin(field.map(|chunk| chunk.map_err(std::io::Error::other)))
}

/// An artifact part held in an anonymous temporary file.
///
/// The file is unlinked on creation, so it disappears when this value is
/// dropped whatever happens to the request.
#[derive(Debug)]
pub struct SpooledFile {
    /// File name from the part's `Content-Disposition`, unsanitized.
    pub file_name: String,
    file: tokio::fs::File,
}

impl SpooledFile {
    /// Copy the remaining bytes of `field` into a temporary file.
    pub async fn spool(file_name: String, mut field: Field<'_>) -> Result<Self, AppError> {
        let mut file = tokio::fs::File::from_std(tempfile::tempfile().map_err(spool_error)?);
        let mut size = 0u64;
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            file.write_all(&chunk).await.map_err(spool_error)?;
            size += chunk.len() as u64;
        }
        file.flush().await.map_err(spool_error)?;
        file.seek(SeekFrom::Start(0)).await.map_err(spool_error)?;

        tracing::debug!(file_name = %file_name, size, "upload spooled until metadata arrives");
        Ok(Self { file_name, file })
    }

    /// Read the spooled bytes back from the start.
    pub fn into_stream(self) -> ByteStream<'static> {
        Box::pin(ReaderStream::new(self.file))
    }
}

fn spool_error(err: std::io::Error) -> AppError {
    AppError::Internal(format!("cannot spool upload: {err}"))
}

/// Address of the client, for provenance only.
///
/// The first `X-Forwarded-For` entry wins; otherwise the socket peer when
/// the server was started with connect info.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploaderIp(pub Option<String>);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for UploaderIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(Self(forwarded.or(peer)))
    }
}
