//! # Release Records
//!
//! - [`ReleaseDetails`]: upload metadata as sent by clients in the
//!   `details` form field.
//! - [`Release`]: a persisted catalog row.
//! - [`LatestRelease`]: the public view returned by the "latest" query.
//! - [`LatestFilter`]: optional distribution-axis filter for that query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coordinates::Coordinates;
use crate::error::ValidationError;

/// Opaque unique identifier of a release row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema), schema(value_type = String, format = Uuid))]
pub struct ReleaseId(Uuid);

impl ReleaseId {
    /// Create a new random release identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ReleaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Upload metadata supplied alongside an artifact.
///
/// Coordinate fields default to empty so that a JSON document omitting them
/// deserializes and is then rejected by [`ReleaseDetails::coordinates`] with
/// a field-specific message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReleaseDetails {
    /// Application name.
    #[serde(default)]
    pub app_name: String,
    /// Application version.
    #[serde(default)]
    pub app_version: String,
    /// Application build.
    #[serde(default)]
    pub app_build: String,
    /// Source commit the artifact was built from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
    /// Distribution target (operating system or platform).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// CPU architecture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

impl ReleaseDetails {
    /// Validate the coordinate fields.
    pub fn coordinates(&self) -> Result<Coordinates, ValidationError> {
        Coordinates::new(
            self.app_name.clone(),
            self.app_version.clone(),
            self.app_build.clone(),
        )
    }

    /// Optional fields with empty strings collapsed to `None`.
    ///
    /// Older upload clients always send `"target": ""` and `"arch": ""`.
    pub fn normalized(mut self) -> Self {
        self.git_commit = non_empty(self.git_commit);
        self.target = non_empty(self.target);
        self.arch = non_empty(self.arch);
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A persisted release row.
///
/// Immutable after creation except for `download_count`, which only grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Release {
    /// Row identifier.
    pub id: ReleaseId,
    /// Application name.
    pub app_name: String,
    /// Application version.
    pub app_version: String,
    /// Application build.
    pub app_build: String,
    /// Source commit the artifact was built from.
    pub git_commit: Option<String>,
    /// Distribution target (operating system or platform).
    pub target: Option<String>,
    /// CPU architecture.
    pub arch: Option<String>,
    /// Stored artifact file name; last segment of the download path.
    pub main_file_name: String,
    /// Address the upload came from.
    pub uploader_ip: Option<String>,
    /// Number of downloads served for this row.
    pub download_count: i64,
    /// Insertion time; the ordering key for "latest".
    pub created_at: DateTime<Utc>,
}

impl Release {
    /// Build a fresh row for validated coordinates.
    ///
    /// `download_count` starts at zero and `created_at` is the current time.
    pub fn new(
        coordinates: &Coordinates,
        details: &ReleaseDetails,
        main_file_name: impl Into<String>,
        uploader_ip: Option<String>,
    ) -> Self {
        Self {
            id: ReleaseId::new(),
            app_name: coordinates.app_name().to_string(),
            app_version: coordinates.app_version().to_string(),
            app_build: coordinates.app_build().to_string(),
            git_commit: details.git_commit.clone(),
            target: details.target.clone(),
            arch: details.arch.clone(),
            main_file_name: main_file_name.into(),
            uploader_ip,
            download_count: 0,
            created_at: Utc::now(),
        }
    }

    /// Whether this row sits at the given coordinates with the given file name.
    pub fn is_at(&self, coordinates: &Coordinates, file_name: &str) -> bool {
        self.app_name == coordinates.app_name()
            && self.app_version == coordinates.app_version()
            && self.app_build == coordinates.app_build()
            && self.main_file_name == file_name
    }
}

/// Distribution-axis filter for the latest-release query.
///
/// `None` fields match any value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LatestFilter {
    /// Distribution target (operating system or platform).
    #[serde(default)]
    pub target: Option<String>,
    /// CPU architecture.
    #[serde(default)]
    pub arch: Option<String>,
}

impl LatestFilter {
    /// Filter with blank fields treated as unset.
    pub fn normalized(self) -> Self {
        Self {
            target: non_empty(self.target),
            arch: non_empty(self.arch),
        }
    }

    /// Whether the release satisfies every set field of the filter.
    pub fn matches(&self, release: &Release) -> bool {
        fn axis(want: &Option<String>, have: &Option<String>) -> bool {
            match want {
                Some(w) => have.as_deref() == Some(w.as_str()),
                None => true,
            }
        }
        axis(&self.target, &release.target) && axis(&self.arch, &release.arch)
    }
}

/// Public view of the newest release for an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LatestRelease {
    /// Application version.
    pub app_version: String,
    /// Application build.
    pub app_build: String,
    /// Application name.
    pub app_name: String,
    /// Where the artifact can be fetched.
    pub download_url: String,
    /// Distribution target (operating system or platform).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// CPU architecture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}
