//! # Middleware
//!
//! Authentication lives in [`crate::auth`]; this module holds the
//! cross-cutting layers applied to every route.

pub mod tracing_layer;
