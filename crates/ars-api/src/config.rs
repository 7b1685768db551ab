//! # Server Configuration
//!
//! Read once at startup into an [`AppConfig`] and passed down explicitly.
//! Nothing below this module touches the process environment.
//!
//! | Variable | Required | Meaning |
//! |----------|----------|---------|
//! | `ARS_BACKEND_USERNAME` | yes | Basic-auth user for `/admin/*` |
//! | `ARS_BACKEND_PASSWORD` | yes | Basic-auth password for `/admin/*` |
//! | `ARS_FILE_STORAGE_PATH` | yes | Artifact root directory |
//! | `PORT` | no | Listen port (default 8080; `--port` wins) |
//! | `DATABASE_URL` | no | PostgreSQL URL; in-memory catalog when absent |
//! | `ARS_PUBLIC_BASE_URL` | no | Scheme + host prefixed to download URLs |
//! | `ARS_MAX_UPLOAD_BYTES` | no | Upload body limit (default 1 GiB) |

use std::path::PathBuf;

pub use ars_core::Credentials;
use url::Url;
use zeroize::Zeroizing;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default upload body limit.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

/// Server configuration.
///
/// Custom `Debug` redacts the password and the database URL, which may
/// carry credentials of its own.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Credentials guarding the upload endpoint.
    pub credentials: Credentials,
    /// Root directory of the artifact store.
    pub storage_path: PathBuf,
    /// PostgreSQL connection URL. `None` selects the in-memory catalog.
    pub database_url: Option<Zeroizing<String>>,
    /// Absolute prefix for download URLs in "latest" responses.
    pub public_base_url: Option<Url>,
    /// Maximum accepted upload body size in bytes.
    pub max_upload_bytes: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("credentials", &self.credentials)
            .field("storage_path", &self.storage_path)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("public_base_url", &self.public_base_url)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            None => DEFAULT_PORT,
        };

        let max_upload_bytes = match get("ARS_MAX_UPLOAD_BYTES") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::Invalid("ARS_MAX_UPLOAD_BYTES", raw)),
            },
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let public_base_url = get("ARS_PUBLIC_BASE_URL")
            .map(|raw| parse_base_url(&raw))
            .transpose()?;

        Ok(Self {
            port,
            credentials: Credentials::new(
                require("ARS_BACKEND_USERNAME")?,
                require("ARS_BACKEND_PASSWORD")?,
            ),
            storage_path: PathBuf::from(require("ARS_FILE_STORAGE_PATH")?),
            database_url: get("DATABASE_URL").map(Zeroizing::new),
            public_base_url,
            max_upload_bytes,
        })
    }

    /// Override the listen port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|_| ConfigError::Invalid("ARS_PUBLIC_BASE_URL", raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::Invalid("ARS_PUBLIC_BASE_URL", raw.to_string()));
    }
    Ok(url)
}

/// Configuration errors. All are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
