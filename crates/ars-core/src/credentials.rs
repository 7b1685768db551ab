//! # Basic-auth Credentials
//!
//! The user name and password pair guarding administrative uploads. The
//! server compares incoming requests against one; the CLI sends one.

use zeroize::Zeroizing;

/// A Basic-auth user name and password.
///
/// The password is wiped from memory on drop and never printed by `Debug`.
#[derive(Clone)]
pub struct Credentials {
    /// User name, sent and compared verbatim.
    pub username: String,
    /// Password.
    pub password: Zeroizing<String>,
}

impl Credentials {
    /// Build credentials from a user name and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
