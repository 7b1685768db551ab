//! # Basic Authentication Middleware
//!
//! Guards the administrative routes (`/admin/*`) with HTTP Basic
//! authentication against a single configured credential pair.
//!
//! Rejections are `401 Unauthorized` with `WWW-Authenticate: Basic` and the
//! standard JSON error body. Download and "latest" routes are public and
//! never pass through this layer.

use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::Engine;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::config::Credentials;
use crate::error::ErrorBody;

/// Realm advertised in the `WWW-Authenticate` challenge.
pub const REALM: &str = "app-release-server";

/// Auth configuration injected into request extensions.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub credentials: Credentials,
}

/// Constant-time comparison of credential components.
///
/// When lengths differ, performs a dummy comparison so that timing does not
/// reveal the expected length.
fn constant_time_eq(provided: &[u8], expected: &[u8]) -> bool {
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Decode `Authorization: Basic <base64(user:pass)>`.
///
/// The scheme name is matched case-insensitively. The password may itself
/// contain colons; only the first one separates it from the user name.
pub fn parse_basic_credentials(
    headers: &HeaderMap,
) -> Result<(String, Zeroizing<String>), &'static str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or("missing authorization header")?
        .to_str()
        .map_err(|_| "authorization header is not valid ASCII")?;

    let (scheme, encoded) = value
        .split_once(' ')
        .ok_or("authorization header must use Basic scheme")?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err("authorization header must use Basic scheme");
    }

    let decoded = Zeroizing::new(
        base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|_| "malformed Basic credentials")?,
    );
    let decoded = std::str::from_utf8(&decoded).map_err(|_| "malformed Basic credentials")?;
    let (user, pass) = decoded
        .split_once(':')
        .ok_or("malformed Basic credentials")?;

    Ok((user.to_string(), Zeroizing::new(pass.to_string())))
}

/// Check a request's credentials against the configured pair.
fn verify(headers: &HeaderMap, expected: &Credentials) -> Result<String, &'static str> {
    let (user, pass) = parse_basic_credentials(headers)?;
    // Evaluate both comparisons so a wrong user name costs the same as a
    // wrong password.
    let user_ok = constant_time_eq(user.as_bytes(), expected.username.as_bytes());
    let pass_ok = constant_time_eq(pass.as_bytes(), expected.password.as_bytes());
    if user_ok & pass_ok {
        Ok(user)
    } else {
        Err("invalid credentials")
    }
}

/// Admit requests carrying the configured Basic credentials.
///
/// Requests without an [`AuthConfig`] extension are rejected: the layer
/// fails closed when mounted without configuration.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let Some(config) = request.extensions().get::<AuthConfig>() else {
        tracing::error!("basic auth middleware mounted without AuthConfig");
        return unauthorized_response("authentication is not configured");
    };

    match verify(request.headers(), &config.credentials) {
        Ok(user) => {
            tracing::debug!(user = %user, "authenticated");
            next.run(request).await
        }
        Err(reason) => {
            tracing::warn!(reason, path = %request.uri().path(), "authentication failed");
            unauthorized_response(reason)
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: format!("unauthorized: {message}"),
        code: "UNAUTHORIZED".to_string(),
    };
    let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    if let Ok(challenge) = HeaderValue::from_str(&format!("Basic realm=\"{REALM}\"")) {
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, challenge);
    }
    response
}
