use anyhow::Result;
use clap::Parser;
use funfit_lib::{AppConfig, AppState, init_logging};
use tracing::info;

#[derive(Parser)]
#[command(name = "ranking-node")]
#[command(about = "Community post backend with hourly best-post ranking", long_about = None)]
struct Cli {
    /// SQLite database url
    #[arg(long, env = "FUNFIT_DATABASE_URL")]
    database_url: Option<String>,

    /// Port for the Prometheus exporter (disabled when omitted)
    #[arg(long, env = "FUNFIT_METRICS_PROMETHEUS_PORT")]
    metrics_port: Option<u16>,

    /// Enable JSON logging
    #[arg(long, env = "FUNFIT_JSON_LOGS")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let mut config = AppConfig::from_env();
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.prometheus_port = Some(port);
    }

    info!("Starting ranking node v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::initialize(config).await?;
    let schedule = state.spawn_rotation_schedule();

    info!("Ranking node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;
    info!("Shutting down ranking node...");

    schedule.abort();
    state.shutdown().await;

    Ok(())
}
