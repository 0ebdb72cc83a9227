//! Request and response bodies for the HTTP API.

use serde::{Deserialize, Serialize};

use fdlctl_core::{LogRecord, RemoteSource, RunOptions};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Flat start-request body as the web viewer sends it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartRequest {
    pub remote_source: bool,
    pub use_default_source: bool,
    pub clear_cache: bool,
    pub remote_host: Option<String>,
    pub remote_user: Option<String>,
    pub remote_password: Option<String>,
    pub remote_port: Option<u16>,
    pub remote_path: Option<String>,
}

impl StartRequest {
    /// Fold the flat wire fields into core run options. Explicit
    /// coordinates count only when they are complete.
    pub fn into_options(self) -> RunOptions {
        let remote = match (
            self.remote_host,
            self.remote_user,
            self.remote_password,
            self.remote_path,
        ) {
            (Some(host), Some(user), Some(password), Some(path)) => Some(RemoteSource {
                host,
                user,
                password,
                port: self.remote_port.unwrap_or(22),
                path,
            }),
            _ => None,
        };
        RunOptions {
            remote_source: self.remote_source,
            use_default_source: self.use_default_source,
            clear_cache: self.clear_cache,
            remote,
        }
    }
}

/// Generic `{success, message}` outcome body.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub is_running: bool,
    pub log: Vec<LogRecord>,
}

#[derive(Debug, Serialize)]
pub struct LogResponse {
    pub log: Vec<LogRecord>,
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub token: Option<String>,
}
