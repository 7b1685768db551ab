//! # Release Coordinates
//!
//! The `(app_name, app_version, app_build)` triple that addresses a release,
//! and the file-name sanitizer applied to every artifact name before it is
//! joined onto a storage path.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Logical coordinates of a release artifact.
///
/// Each field is non-empty and forms exactly one path segment. Construction
/// through [`Coordinates::new`] is the only way to obtain a value, so holders
/// may join the fields onto a filesystem root without further checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinates {
    app_name: String,
    app_version: String,
    app_build: String,
}

impl Coordinates {
    /// Validate and build coordinates.
    ///
    /// Fails with [`ValidationError::MissingField`] when a field is empty or
    /// whitespace-only, and with [`ValidationError::InvalidSegment`] when a
    /// field contains a path separator or is a relative directory reference.
    pub fn new(
        app_name: impl Into<String>,
        app_version: impl Into<String>,
        app_build: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let app_name = checked_segment("app_name", app_name.into())?;
        let app_version = checked_segment("app_version", app_version.into())?;
        let app_build = checked_segment("app_build", app_build.into())?;
        Ok(Self {
            app_name,
            app_version,
            app_build,
        })
    }

    /// Application name.
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Application version.
    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    /// Application build.
    pub fn app_build(&self) -> &str {
        &self.app_build
    }

    /// The three path segments in addressing order.
    pub fn segments(&self) -> [&str; 3] {
        [&self.app_name, &self.app_version, &self.app_build]
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.app_name, self.app_version, self.app_build)
    }
}

fn checked_segment(field: &'static str, value: String) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    if is_unsafe_segment(&value) {
        return Err(ValidationError::InvalidSegment { field, value });
    }
    Ok(value)
}

fn is_unsafe_segment(value: &str) -> bool {
    value == "." || value == ".." || value.contains(['/', '\\', '\0'])
}

/// Reduce a client-supplied file name to its base component.
///
/// Trailing separators are ignored and everything up to the last `/` or `\`
/// is dropped, so `"../../etc/passwd"` becomes `"passwd"`. Names whose base
/// component is empty, `.` or `..` are rejected.
pub fn sanitize_file_name(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim_end_matches(['/', '\\']);
    let base = trimmed.rsplit(['/', '\\']).next().unwrap_or_default();

    if base.trim().is_empty() || base == "." || base == ".." || base.contains('\0') {
        return Err(ValidationError::InvalidFileName(raw.to_string()));
    }
    Ok(base.to_string())
}
