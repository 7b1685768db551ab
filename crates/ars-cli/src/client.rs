//! Typed HTTP client for the release server API.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ars_core::{Credentials, LatestFilter, LatestRelease, Release, ReleaseDetails};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

/// Errors from the release server client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server base URL cannot carry path segments.
    #[error("invalid server URL: {0}")]
    InvalidBaseUrl(String),

    /// Transport failure or undecodable response.
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The artifact file could not be opened.
    #[error("cannot read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Release metadata could not be encoded.
    #[error("cannot encode release details: {0}")]
    Encode(#[from] serde_json::Error),

    /// The server answered with a non-success status.
    #[error("server returned {status} ({code}): {message}")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
    },
}

/// Error body returned by the server.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    code: String,
}

/// Client for one release server.
#[derive(Debug, Clone)]
pub struct ReleaseClient {
    http: reqwest::Client,
    base: Url,
}

impl ReleaseClient {
    /// Create a client for the server at `base` (scheme, host, optional
    /// path prefix).
    pub fn new(base: Url, timeout: Duration) -> Result<Self, ClientError> {
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base.to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ClientError::Http {
                endpoint: "client_init".into(),
                source,
            })?;
        Ok(Self { http, base })
    }

    /// The server base URL.
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Upload the file at `path`, streamed from disk. The artifact keeps the
    /// path's file name.
    pub async fn upload_file(
        &self,
        credentials: &Credentials,
        details: &ReleaseDetails,
        path: &Path,
    ) -> Result<Release, ClientError> {
        let file_err = |source: std::io::Error| ClientError::File {
            path: path.to_path_buf(),
            source,
        };
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                file_err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "no usable file name",
                ))
            })?;
        let file = tokio::fs::File::open(path).await.map_err(&file_err)?;
        let length = file.metadata().await.map_err(&file_err)?.len();

        self.upload(credentials, details, file_name, file, length)
            .await
    }

    /// Upload an artifact with its release metadata.
    ///
    /// `data` is sent as the `file` part without being buffered; `length`
    /// must be its exact size in bytes. Metadata goes first so the server
    /// can validate it before the artifact arrives.
    pub async fn upload(
        &self,
        credentials: &Credentials,
        details: &ReleaseDetails,
        file_name: &str,
        data: impl Into<reqwest::Body>,
        length: u64,
    ) -> Result<Release, ClientError> {
        let url = self.endpoint(&["admin", "upload", "app"])?;
        let endpoint = url.path().to_string();
        let http_err = |source: reqwest::Error| ClientError::Http {
            endpoint: endpoint.clone(),
            source,
        };

        let details = serde_json::to_string(details)?;
        let file = Part::stream_with_length(data, length)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .map_err(&http_err)?;
        let form = Form::new().text("details", details).part("file", file);

        tracing::debug!(url = %url, file_name, length, "uploading release");
        let response = self
            .http
            .post(url)
            .basic_auth(&credentials.username, Some(credentials.password.as_str()))
            .multipart(form)
            .send()
            .await
            .map_err(&http_err)?;

        decode(response, &endpoint).await
    }

    /// Latest release of `app_name`, optionally narrowed by target and arch.
    pub async fn latest(
        &self,
        app_name: &str,
        filter: &LatestFilter,
    ) -> Result<LatestRelease, ClientError> {
        let mut url = self.endpoint(&["apps", app_name, "latest"])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(target) = &filter.target {
                query.append_pair("target", target);
            }
            if let Some(arch) = &filter.arch {
                query.append_pair("arch", arch);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        let endpoint = url.path().to_string();

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| ClientError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;

        decode(response, &endpoint).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    endpoint: &str,
) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.map_err(|source| ClientError::Http {
            endpoint: endpoint.to_string(),
            source,
        });
    }

    let text = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (body.code, body.error),
        Err(_) => ("UNKNOWN".to_string(), text),
    };
    Err(ClientError::Api {
        status,
        code,
        message,
    })
}
