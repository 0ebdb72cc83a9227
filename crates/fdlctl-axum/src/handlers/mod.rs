//! HTTP request handlers for the panel API.
//!
//! Handlers are thin: authenticate, delegate to the controller or
//! runner, shape the response body.

pub mod auth;
pub mod job;
pub mod stream;
