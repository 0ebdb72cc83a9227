//! Environment-backed configuration assembly.
//!
//! The remote-source variables intentionally share the pipeline's own
//! env names (REMOTE_HOST, REMOTE_USER, ...) so one `.env` file serves
//! both the panel and the pipeline it fronts.

use anyhow::{Context, Result};

use fdlctl_axum::{AuthConfig, CorsConfig, ServerConfig};
use fdlctl_core::RemoteSource;
use fdlctl_runtime::PipelineConfig;

use crate::Cli;

pub(crate) fn load(cli: &Cli) -> Result<ServerConfig> {
    let auth = AuthConfig {
        signing_key: require_env("FDLCTL_AUTH_SECRET")?,
        panel_password: require_env("FDLCTL_PASSWORD")?,
        token_ttl_seconds: env_u64("FDLCTL_TOKEN_TTL_SECS", 8 * 60 * 60)?,
    };

    let mut pipeline = PipelineConfig::new(&cli.pipeline_dir);
    if let Ok(python) = std::env::var("FDLCTL_PYTHON_BIN") {
        pipeline.python_bin = python.into();
    }
    if let Ok(zip) = std::env::var("FDLCTL_LOCAL_ZIP") {
        pipeline.local_zip = Some(zip.into());
    }
    pipeline.default_remote = default_remote_from_env();

    Ok(ServerConfig {
        port: cli.port,
        auth,
        pipeline,
        cors: CorsConfig::AllowAll,
    })
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{key} must be set"))
}

fn env_u64(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{key} must be an integer")),
        Err(_) => Ok(default),
    }
}

/// Default remote coordinates; present only when fully configured.
fn default_remote_from_env() -> Option<RemoteSource> {
    let host = std::env::var("REMOTE_HOST").ok()?;
    let user = std::env::var("REMOTE_USER").ok()?;
    let password = std::env::var("REMOTE_PASSWORD").ok()?;
    let path = std::env::var("REMOTE_PATH").ok()?;
    let port = std::env::var("REMOTE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(22);
    Some(RemoteSource {
        host,
        user,
        password,
        port,
        path,
    })
}
