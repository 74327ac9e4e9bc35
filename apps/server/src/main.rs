use anyhow::Context;
use clap::{Parser, Subcommand};
use roster_config::{load as load_config, AppConfig};
use roster_gateway::create_router;
use roster_runtime::{telemetry, BackendServices};
use tokio::net::TcpListener;
use tracing::info;

const REDACTED: &str = "<redacted>";

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Roster user service (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Print the effective configuration with secrets redacted
    ShowConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::ShowConfig => show_config(),
    }
}

async fn run_server() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;

    telemetry::init_tracing(&config.log).context("failed to initialise tracing")?;

    info!(name = %config.app.name, version = %config.app.version, "starting Roster");

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let app = create_router(services.gateway_state());

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(roster_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("server shut down");
    Ok(())
}

fn show_config() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    let rendered = serde_json::to_string_pretty(&redacted(config))
        .context("failed to render configuration")?;
    println!("{rendered}");
    Ok(())
}

fn redacted(mut config: AppConfig) -> AppConfig {
    config.auth.jwt_secret = REDACTED.to_string();
    config
}
