//! Axum web adapter for fdlctl.
//!
//! Exposes the job controller over HTTP: start/cancel/reset/status
//! operations, the SSE log stream with full replay for late joiners,
//! and the bearer-token auth gate in front of all of it.

#![deny(unused_crate_dependencies)]

// Silence unused dev-dependency warnings: these are exercised by the
// router-level tests in tests/api.rs
#[cfg(test)]
use http_body_util as _;
#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tower as _;

pub mod auth;
pub mod bootstrap;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

// Re-export primary types
pub use auth::{AuthConfig, AuthGate};
pub use bootstrap::{AppContext, CorsConfig, ServerConfig, bootstrap, start_server};
pub use error::HttpError;
pub use routes::create_router;
pub use state::AppState;
