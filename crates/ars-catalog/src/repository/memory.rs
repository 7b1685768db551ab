//! In-process repository used when no database is configured, and in tests.
//!
//! Rows are kept in insertion order, which doubles as the tie-breaker for
//! equal `created_at` values.

use ars_core::{Coordinates, LatestFilter, Release, ReleaseId};
use async_trait::async_trait;
use parking_lot::RwLock;

use super::ReleaseRepository;
use crate::error::PersistenceError;

/// Thread-safe in-memory release repository.
///
/// `parking_lot::RwLock` is never held across an `.await`, and every
/// increment happens under the write lock.
#[derive(Debug, Default)]
pub struct MemoryReleaseRepository {
    rows: RwLock<Vec<Release>>,
}

impl MemoryReleaseRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Whether the repository holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch a row by id.
    pub fn get(&self, id: ReleaseId) -> Option<Release> {
        self.rows.read().iter().find(|r| r.id == id).cloned()
    }
}

#[async_trait]
impl ReleaseRepository for MemoryReleaseRepository {
    async fn insert(&self, release: &Release) -> Result<ReleaseId, PersistenceError> {
        let mut rows = self.rows.write();
        if rows.iter().any(|r| r.id == release.id) {
            return Err(PersistenceError::Backend(format!(
                "duplicate release id {}",
                release.id
            )));
        }
        rows.push(release.clone());
        Ok(release.id)
    }

    async fn find_latest_by_app_name(
        &self,
        app_name: &str,
        filter: &LatestFilter,
    ) -> Result<Option<Release>, PersistenceError> {
        // `max_by_key` yields the last of several equal maxima, i.e. the
        // most recently inserted row.
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|r| r.app_name == app_name && filter.matches(r))
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn increment_download_count(&self, id: ReleaseId) -> Result<bool, PersistenceError> {
        let mut rows = self.rows.write();
        match rows.iter_mut().find(|r| r.id == id) {
            Some(row) => {
                row.download_count += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_by_coordinates(
        &self,
        coordinates: &Coordinates,
        file_name: &str,
    ) -> Result<Option<Release>, PersistenceError> {
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|r| r.is_at(coordinates, file_name))
            .max_by_key(|r| r.created_at)
            .cloned())
    }
}
