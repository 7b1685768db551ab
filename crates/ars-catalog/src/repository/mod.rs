//! # Release Persistence
//!
//! The catalog talks to storage through [`ReleaseRepository`] only. The
//! interface is deliberately narrow: insert, two lookups, and an atomic
//! counter increment. Rows are never updated otherwise and never deleted.

pub mod memory;
pub mod postgres;

use ars_core::{Coordinates, LatestFilter, Release, ReleaseId};
use async_trait::async_trait;

use crate::error::PersistenceError;

/// Persistence interface for release rows.
#[async_trait]
pub trait ReleaseRepository: Send + Sync {
    /// Insert a new row. Duplicate coordinates are allowed.
    async fn insert(&self, release: &Release) -> Result<ReleaseId, PersistenceError>;

    /// The row for `app_name` with the greatest `created_at` among those
    /// matching `filter`. Ties go to the most recently inserted row.
    async fn find_latest_by_app_name(
        &self,
        app_name: &str,
        filter: &LatestFilter,
    ) -> Result<Option<Release>, PersistenceError>;

    /// Add one to `download_count` as a single atomic operation.
    ///
    /// Returns `false` when no row has the given id.
    async fn increment_download_count(&self, id: ReleaseId) -> Result<bool, PersistenceError>;

    /// The newest row at `coordinates` whose stored file is `file_name`.
    async fn find_by_coordinates(
        &self,
        coordinates: &Coordinates,
        file_name: &str,
    ) -> Result<Option<Release>, PersistenceError>;
}
