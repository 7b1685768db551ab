//! # ars-catalog — Release Catalog
//!
//! Owns the lifecycle of release rows and orchestrates the artifact store.
//!
//! | Operation | Entry point |
//! |-----------|-------------|
//! | Create a release | [`ReleaseCatalog::create_release`] |
//! | Latest release for an app | [`ReleaseCatalog::get_latest`] |
//! | Download an artifact | [`ReleaseCatalog::download`] |
//! | Artifact metadata, uncounted | [`ReleaseCatalog::open`] |
//! | Download URL of a release | [`ReleaseCatalog::download_url`] |
//!
//! Persistence sits behind the narrow [`ReleaseRepository`] trait with two
//! implementations: [`MemoryReleaseRepository`] (development, tests) and
//! [`PgReleaseRepository`] (PostgreSQL via SQLx).

pub mod catalog;
pub mod error;
pub mod repository;

pub use catalog::{NewRelease, ReleaseCatalog};
pub use error::{CatalogError, PersistenceError};
pub use repository::memory::MemoryReleaseRepository;
pub use repository::postgres::PgReleaseRepository;
pub use repository::ReleaseRepository;
