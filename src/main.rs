//! NotifyMeOn - direct-message alerts for guild events
//!
//! Runs the command API that toggles subscriptions and filters and
//! dispatches incoming audit-log entries to subscribers.

use anyhow::Result;
use clap::{Parser, Subcommand};
use notifymeon::{
    api::{notify_router, NotifyState},
    channels::DiscordClient,
    config::NotifyConfig,
    dispatch::Dispatcher,
    store::{ConfigBackend, JsonFileBackend},
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "notifymeon")]
#[command(version)]
#[command(about = "Direct-message alerts for guild events")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "NOTIFYMEON_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the command API
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("notifymeon={},tower_http=info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match &cli.config {
        Some(path) => NotifyConfig::from_file(path)?,
        None => NotifyConfig::default(),
    };

    match cli.command {
        Commands::Serve { host, port } => {
            run_server(config, host, port).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

async fn run_server(config: NotifyConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    tracing::info!("Starting NotifyMeOn");

    let backend: Arc<dyn ConfigBackend> =
        Arc::new(JsonFileBackend::new(config.storage.data_dir.clone()).await?);
    let discord = Arc::new(DiscordClient::from_config(&config.discord)?);
    let dispatcher = Arc::new(Dispatcher::new(discord.clone(), discord));

    let state = NotifyState::new(
        config.discord.clone(),
        backend,
        dispatcher,
        config.notify.history_capacity,
    );
    let app = notify_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    tracing::info!(
        "NotifyMeOn listening on {} (data dir {})",
        listener.local_addr()?,
        config.storage.data_dir.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        })
        .await?;

    Ok(())
}

fn show_config(config: Option<&NotifyConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
