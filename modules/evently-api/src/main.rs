use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use evently_api::{connect_store, ingress, Dispatcher};
use evently_common::{Config, LogFormat};

#[derive(Parser)]
#[command(name = "evently-api", about = "Event management API")]
struct Cli {
    /// Path to an optional TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the API over HTTP (default)
    Serve,
    /// Handle a single gateway proxy event and print the response envelope
    Invoke {
        /// File holding the event JSON; reads stdin when omitted
        #[arg(long)]
        event: Option<PathBuf>,
    },
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("evently=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    init_tracing(config.log_format);
    config.log_summary();

    let store = connect_store(&config.store).await?;
    let dispatcher = Dispatcher::new(store);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(dispatcher, &config.addr()).await,
        Command::Invoke { event } => invoke(dispatcher, event).await,
    }
}

async fn serve(dispatcher: Dispatcher, addr: &str) -> Result<()> {
    let app = ingress::router(dispatcher);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Evently API listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Evently API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn invoke(dispatcher: Dispatcher, event: Option<PathBuf>) -> Result<()> {
    let raw = match &event {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file: {}", path.display()))?,
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read event from stdin")?;
            raw
        }
    };
    let event: serde_json::Value =
        serde_json::from_str(&raw).context("Event is not valid JSON")?;

    let response = ingress::handle_event(&dispatcher, event).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
