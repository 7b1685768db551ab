//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor. Cloning is cheap: everything sits behind an
//! `Arc`.

use std::sync::Arc;

use ars_catalog::ReleaseCatalog;

use crate::config::AppConfig;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The release catalog.
    pub catalog: Arc<ReleaseCatalog>,
    /// Configuration read at startup.
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wrap an assembled catalog and its configuration.
    pub fn new(config: AppConfig, catalog: ReleaseCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            config: Arc::new(config),
        }
    }
}
