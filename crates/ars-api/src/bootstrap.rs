//! # Startup
//!
//! Turns an [`AppConfig`] into a ready [`AppState`]:
//!
//! 1. **Storage root**: created if missing.
//! 2. **Release repository**: PostgreSQL with embedded migrations when
//!    `DATABASE_URL` is set, otherwise the in-memory repository.
//! 3. **Download URLs**: relative, or under `ARS_PUBLIC_BASE_URL`.

use std::sync::Arc;

use ars_catalog::{
    MemoryReleaseRepository, PersistenceError, PgReleaseRepository, ReleaseCatalog,
    ReleaseRepository,
};
use ars_core::DownloadUrlBuilder;
use ars_storage::FsArtifactStore;

use crate::config::AppConfig;
use crate::state::AppState;

/// Errors during startup.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The storage root could not be created.
    #[error("cannot prepare storage root {path}: {source}")]
    StorageRoot {
        path: String,
        source: std::io::Error,
    },

    /// Database connection or migration failed.
    #[error("database initialization failed: {0}")]
    Database(#[from] PersistenceError),
}

/// Build the application state from configuration.
pub async fn bootstrap(config: AppConfig) -> Result<AppState, BootstrapError> {
    tokio::fs::create_dir_all(&config.storage_path)
        .await
        .map_err(|source| BootstrapError::StorageRoot {
            path: config.storage_path.display().to_string(),
            source,
        })?;

    let repository: Arc<dyn ReleaseRepository> = match &config.database_url {
        Some(url) => {
            let repo = PgReleaseRepository::connect(url).await?;
            tracing::info!("release catalog backed by PostgreSQL");
            Arc::new(repo)
        }
        None => {
            tracing::warn!(
                "DATABASE_URL not set; using the in-memory release catalog. \
                 Releases will be lost on restart."
            );
            Arc::new(MemoryReleaseRepository::new())
        }
    };

    let catalog = ReleaseCatalog::new(
        repository,
        Arc::new(FsArtifactStore::new(&config.storage_path)),
        download_urls(&config),
    );

    tracing::info!(
        storage_path = %config.storage_path.display(),
        public_base_url = config.public_base_url.as_ref().map(|u| u.as_str()),
        max_upload_bytes = config.max_upload_bytes,
        "release server configured"
    );

    Ok(AppState::new(config, catalog))
}

/// Download URL builder for the configured public base, if any.
pub fn download_urls(config: &AppConfig) -> DownloadUrlBuilder {
    match &config.public_base_url {
        Some(base) => DownloadUrlBuilder::absolute(base.as_str()),
        None => DownloadUrlBuilder::relative(),
    }
}
