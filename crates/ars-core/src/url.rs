//! # Download URLs
//!
//! Builds the public download location of a release:
//! `/apps/{app_name}/{app_version}/{app_build}/{main_file_name}`, optionally
//! prefixed with an absolute base such as `https://releases.example.com`.
//!
//! Each segment is percent-encoded, so names containing `#`, `?`, `%` or
//! spaces still produce a URL that routes back to the artifact.

use crate::release::{LatestRelease, Release};

/// Path prefix under which artifacts are served.
pub const DOWNLOAD_PREFIX: &str = "/apps";

/// Builds download URLs for releases.
///
/// Pure: no I/O and no failure mode. Empty fields pass through as empty
/// path segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadUrlBuilder {
    base: Option<String>,
}

impl DownloadUrlBuilder {
    /// Builder producing root-relative URLs.
    pub fn relative() -> Self {
        Self { base: None }
    }

    /// Builder producing absolute URLs under `base` (scheme + host, optional
    /// path prefix). Trailing slashes on `base` are ignored.
    pub fn absolute(base: impl AsRef<str>) -> Self {
        let base = base.as_ref().trim_end_matches('/');
        if base.is_empty() {
            return Self::relative();
        }
        Self {
            base: Some(base.to_string()),
        }
    }

    /// The configured base, if any.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Download URL for a release.
    pub fn build(&self, release: &Release) -> String {
        let path = format!(
            "{DOWNLOAD_PREFIX}/{}/{}/{}/{}",
            urlencoding::encode(&release.app_name),
            urlencoding::encode(&release.app_version),
            urlencoding::encode(&release.app_build),
            urlencoding::encode(&release.main_file_name),
        );
        match &self.base {
            Some(base) => format!("{base}{path}"),
            None => path,
        }
    }

    /// Public "latest" view of a release, with its download URL resolved.
    pub fn latest(&self, release: &Release) -> LatestRelease {
        LatestRelease {
            app_version: release.app_version.clone(),
            app_build: release.app_build.clone(),
            app_name: release.app_name.clone(),
            download_url: self.build(release),
            target: release.target.clone(),
            arch: release.arch.clone(),
        }
    }
}
