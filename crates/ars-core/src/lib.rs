#![deny(missing_docs)]

//! # ars-core — Foundational Types for the App Release Server
//!
//! Every other crate in the workspace depends on this one. It has no internal
//! crate dependencies and performs no I/O.
//!
//! ## Addressing Scheme
//!
//! A release artifact is addressed by its [`Coordinates`]
//! (`app_name`, `app_version`, `app_build`) plus a sanitized file name:
//!
//! ```text
//! {root}/{app_name}/{app_version}/{app_build}/{file_name}     (on disk)
//! /apps/{app_name}/{app_version}/{app_build}/{file_name}      (download URL)
//! ```
//!
//! [`Coordinates`] and [`sanitize_file_name`] are the only ways to produce the
//! path segments, so a value that reached the storage layer can never escape
//! the storage root.

pub mod coordinates;
pub mod credentials;
pub mod error;
pub mod release;
pub mod url;

pub use coordinates::{sanitize_file_name, Coordinates};
pub use credentials::Credentials;
pub use error::ValidationError;
pub use release::{LatestFilter, LatestRelease, Release, ReleaseDetails, ReleaseId};
pub use url::DownloadUrlBuilder;
