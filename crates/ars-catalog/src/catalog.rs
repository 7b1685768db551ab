//! # Release Catalog Service
//!
//! Validates uploads, stores artifacts, records release rows, and answers
//! latest/download queries.
//!
//! ## Policies
//!
//! - Uploaded artifacts keep their original file name, reduced to its base
//!   component.
//! - Downloads fall back to the artifact store when no catalog row matches:
//!   the file is still served, only the counter is skipped.
//! - Re-uploads to identical coordinates coexist as separate rows; the file
//!   on disk is overwritten.

use std::sync::Arc;

use ars_core::{
    sanitize_file_name, Coordinates, DownloadUrlBuilder, LatestFilter, LatestRelease, Release,
    ReleaseDetails,
};
use ars_storage::{ArtifactStore, ByteStream, StoredArtifact};

use crate::error::CatalogError;
use crate::repository::ReleaseRepository;

/// An upload request, decoupled from the transport.
#[derive(Debug, Clone)]
pub struct NewRelease {
    /// Metadata from the `details` field.
    pub details: ReleaseDetails,
    /// File name as sent by the client, before sanitization.
    pub file_name: String,
    /// Address the upload came from, if known.
    pub uploader_ip: Option<String>,
}

/// The release catalog.
///
/// Cheap to clone; the repository and store are shared.
#[derive(Clone)]
pub struct ReleaseCatalog {
    repository: Arc<dyn ReleaseRepository>,
    store: Arc<dyn ArtifactStore>,
    urls: DownloadUrlBuilder,
}

impl std::fmt::Debug for ReleaseCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseCatalog")
            .field("urls", &self.urls)
            .finish_non_exhaustive()
    }
}

impl ReleaseCatalog {
    /// Assemble a catalog from its collaborators.
    pub fn new(
        repository: Arc<dyn ReleaseRepository>,
        store: Arc<dyn ArtifactStore>,
        urls: DownloadUrlBuilder,
    ) -> Self {
        Self {
            repository,
            store,
            urls,
        }
    }

    /// Validate, store, and record a new release.
    ///
    /// Validation happens before any bytes are written, so a rejected upload
    /// leaves nothing behind. If the row insert fails after the artifact was
    /// written, the file stays on disk and the error is returned.
    pub async fn create_release(
        &self,
        upload: NewRelease,
        data: ByteStream<'_>,
    ) -> Result<Release, CatalogError> {
        let details = upload.details.normalized();
        let coordinates = details.coordinates()?;
        let file_name = sanitize_file_name(&upload.file_name)?;

        let stored = self.store.put(&coordinates, &file_name, data).await?;

        let release = Release::new(&coordinates, &details, stored.file_name(), upload.uploader_ip);
        if let Err(e) = self.repository.insert(&release).await {
            tracing::warn!(
                path = %stored.path().display(),
                error = %e,
                "artifact stored but release row was not persisted"
            );
            return Err(e.into());
        }

        tracing::info!(
            release_id = %release.id,
            coordinates = %coordinates,
            file_name = %release.main_file_name,
            size = stored.size(),
            "release created"
        );
        Ok(release)
    }

    /// The newest release of `app_name` matching `filter`.
    pub async fn get_latest(
        &self,
        app_name: &str,
        filter: &LatestFilter,
    ) -> Result<Release, CatalogError> {
        self.repository
            .find_latest_by_app_name(app_name, filter)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("no release found for {app_name}")))
    }

    /// Open an artifact for download.
    ///
    /// When a catalog row exists at these coordinates its `download_count` is
    /// incremented once. Lookup or increment failures are logged and do not
    /// block the download.
    pub async fn download(
        &self,
        coordinates: &Coordinates,
        file_name: &str,
    ) -> Result<StoredArtifact, CatalogError> {
        let file_name = sanitize_file_name(file_name)?;
        self.record_download(coordinates, &file_name).await;
        Ok(self.store.get(coordinates, &file_name).await?)
    }

    /// Open an artifact without counting a download, for metadata-only
    /// requests.
    pub async fn open(
        &self,
        coordinates: &Coordinates,
        file_name: &str,
    ) -> Result<StoredArtifact, CatalogError> {
        let file_name = sanitize_file_name(file_name)?;
        Ok(self.store.get(coordinates, &file_name).await?)
    }

    async fn record_download(&self, coordinates: &Coordinates, file_name: &str) {
        let release = match self.repository.find_by_coordinates(coordinates, file_name).await {
            Ok(Some(release)) => release,
            Ok(None) => {
                tracing::debug!(%coordinates, file_name, "download without catalog row");
                return;
            }
            Err(e) => {
                tracing::warn!(%coordinates, file_name, error = %e, "release lookup failed");
                return;
            }
        };

        if let Err(e) = self.repository.increment_download_count(release.id).await {
            tracing::warn!(release_id = %release.id, error = %e, "download count increment failed");
        }
    }

    /// Download URL of a release.
    pub fn download_url(&self, release: &Release) -> String {
        self.urls.build(release)
    }

    /// Public "latest" view of a release.
    pub fn latest_view(&self, release: &Release) -> LatestRelease {
        self.urls.latest(release)
    }
}
