//! Axum server bootstrap - the composition root.
//!
//! This is the ONLY place where the controller, runner and auth gate
//! are instantiated and wired together. Handlers reach them through
//! the shared `AppState`; no component holds ambient globals.

use std::sync::Arc;

use anyhow::Result;

use fdlctl_runtime::{JobController, PipelineConfig, PipelineRunner};

use crate::auth::{AuthConfig, AuthGate};

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for the HTTP server.
    pub port: u16,
    /// Auth gate settings.
    pub auth: AuthConfig,
    /// External pipeline invocation settings.
    pub pipeline: PipelineConfig,
    /// CORS configuration.
    pub cors: CorsConfig,
}

/// Application context for the Axum adapter.
pub struct AppContext {
    /// The single job controller instance for this process.
    pub controller: Arc<JobController>,
    /// Pipeline runner feeding the controller.
    pub runner: PipelineRunner,
    /// Bearer-token gate in front of every protected handler.
    pub auth: AuthGate,
}

/// Construct all services for the web server.
pub fn bootstrap(config: &ServerConfig) -> AppContext {
    AppContext {
        controller: Arc::new(JobController::new()),
        runner: PipelineRunner::new(config.pipeline.clone()),
        auth: AuthGate::from_config(config.auth.clone()),
    }
}

/// Start the web server on the configured port.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    use tokio::net::TcpListener;
    use tracing::info;

    let ctx = bootstrap(&config);
    let app = crate::routes::create_router(ctx, &config.cors);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("fdlctl panel listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
