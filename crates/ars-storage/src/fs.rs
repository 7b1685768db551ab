use std::path::PathBuf;

use ars_core::{sanitize_file_name, Coordinates};
use async_trait::async_trait;
use futures::StreamExt;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::{ArtifactStore, ByteStream, StorageError, StoredArtifact, StoredPath};

/// Name prefix of in-flight uploads inside a build directory.
const STAGING_PREFIX: &str = ".upload-";

/// Filesystem-based artifact store.
///
/// Each artifact lives at `{root}/{app_name}/{app_version}/{app_build}/{file_name}`.
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage root.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn dir_for(&self, coordinates: &Coordinates) -> PathBuf {
        let mut dir = self.root.clone();
        for segment in coordinates.segments() {
            dir.push(segment);
        }
        dir
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(
        &self,
        coordinates: &Coordinates,
        file_name: &str,
        data: ByteStream<'_>,
    ) -> Result<StoredPath, StorageError> {
        let file_name = sanitize_file_name(file_name)?;
        let dir = self.dir_for(coordinates);
        fs::create_dir_all(&dir).await?;

        // Staged next to the target so the final rename stays on one
        // filesystem. Dropping `staged` on any early return removes it.
        let (staged, staged_path) = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(&dir)?
            .into_parts();
        let mut file = File::from_std(staged);
        let mut stream = data;
        let mut size = 0u64;

        while let Some(chunk) = stream.next().await {
            let bytes = chunk?;
            file.write_all(&bytes).await?;
            size += bytes.len() as u64;
        }
        file.flush().await?;
        drop(file);

        let path = dir.join(&file_name);
        staged_path.persist(&path).map_err(std::io::Error::from)?;

        tracing::debug!(path = %path.display(), size, "artifact written");
        Ok(StoredPath {
            path,
            file_name,
            size,
        })
    }

    async fn get(
        &self,
        coordinates: &Coordinates,
        file_name: &str,
    ) -> Result<StoredArtifact, StorageError> {
        let file_name = sanitize_file_name(file_name)?;
        let path = self.dir_for(coordinates).join(&file_name);
        let key = format!("{coordinates}/{file_name}");

        let file = File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.clone())
            } else {
                StorageError::Io(e)
            }
        })?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(StorageError::NotFound(key));
        }

        Ok(StoredArtifact {
            stream: Box::pin(ReaderStream::new(file)),
            size: metadata.len(),
        })
    }
}
