//! # ars-storage — Artifact Store
//!
//! Persists release binaries at a deterministic location derived from their
//! [`Coordinates`] and file name, and streams them back on request.
//!
//! The [`ArtifactStore`] trait is the seam between the release catalog and
//! the bytes. [`FsArtifactStore`] lays artifacts out as
//! `{root}/{app_name}/{app_version}/{app_build}/{file_name}`.
//!
//! Writes are staged in a hidden file next to the target and renamed over it
//! once the stream completes, so an existing artifact is replaced whole (last
//! writer wins) and a failed write leaves it untouched. There is no checksum
//! verification. Every file name passes through
//! [`ars_core::sanitize_file_name`] before it touches a path.

mod fs;

pub use fs::FsArtifactStore;

use std::path::{Path, PathBuf};
use std::pin::Pin;

use ars_core::{Coordinates, ValidationError};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};

/// A boxed stream of artifact bytes.
///
/// Uploads may borrow from the request they are read from; streams handed
/// out by [`ArtifactStore::get`] are `'static`.
pub type ByteStream<'a> = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send + 'a>>;

/// Error type for artifact storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No artifact exists at the requested location.
    #[error("artifact not found: {0}")]
    NotFound(String),

    /// The file name could not be reduced to a safe base component.
    #[error(transparent)]
    InvalidFileName(#[from] ValidationError),

    /// Directory creation, write, or read failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Location of a freshly written artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPath {
    path: PathBuf,
    file_name: String,
    size: u64,
}

impl StoredPath {
    /// Full path of the written file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sanitized file name the artifact was stored under.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Number of bytes written.
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// An artifact opened for reading.
pub struct StoredArtifact {
    /// Artifact contents.
    pub stream: ByteStream<'static>,
    /// Size in bytes at open time.
    pub size: u64,
}

impl std::fmt::Debug for StoredArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredArtifact")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Artifact storage backend.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write `data` to `coordinates/file_name`, creating missing directories.
    ///
    /// The whole stream is consumed before this returns. When the stream
    /// yields an error, nothing is left at the target path that was not
    /// there before.
    async fn put(
        &self,
        coordinates: &Coordinates,
        file_name: &str,
        data: ByteStream<'_>,
    ) -> Result<StoredPath, StorageError>;

    /// Open the artifact at `coordinates/file_name`.
    async fn get(
        &self,
        coordinates: &Coordinates,
        file_name: &str,
    ) -> Result<StoredArtifact, StorageError>;
}

/// Wrap an in-memory buffer as a single-chunk [`ByteStream`].
pub fn once(data: impl Into<Bytes>) -> ByteStream<'static> {
    let data = data.into();
    Box::pin(futures::stream::once(async move { Ok(data) }))
}

/// Drain a [`ByteStream`] into a contiguous buffer.
pub async fn read_to_bytes(mut stream: ByteStream<'_>) -> Result<Bytes, std::io::Error> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf.freeze())
}
