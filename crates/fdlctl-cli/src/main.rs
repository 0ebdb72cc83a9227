//! CLI entry point - parses arguments, loads the environment and
//! starts the panel server.

use clap::Parser;

mod config;

#[derive(Parser, Debug)]
#[command(
    name = "fdlctl",
    version,
    about = "Web control panel for the cssfdlp FastDL pipeline"
)]
pub(crate) struct Cli {
    /// Port for the HTTP server
    #[arg(long, env = "FDLCTL_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Pipeline checkout directory (venv, script and requirements)
    #[arg(long, env = "FDLCTL_PIPELINE_DIR", default_value = ".")]
    pub pipeline_dir: std::path::PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap resolves env-backed defaults.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = config::load(&cli)?;
    fdlctl_axum::start_server(config).await
}
