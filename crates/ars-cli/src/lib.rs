//! # ars-cli — Client for the App Release Server
//!
//! [`ReleaseClient`] wraps the server's HTTP API; the `ars` binary puts a
//! command line on top of it.
//!
//! ```bash
//! ARS_BACKEND_USERNAME=admin ARS_BACKEND_PASSWORD=... \
//!   ars upload --file target/release/demo --name demo --version 1.0 --build 42
//! ars latest demo --target linux
//! ```

pub mod client;

pub use client::{ClientError, ReleaseClient};
