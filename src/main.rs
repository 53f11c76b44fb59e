use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use lead_intake::config::AppConfig;
use lead_intake::dates::{Clock, SystemClock};
use lead_intake::logging::init_logging;
use lead_intake::models::InboundMessage;
use lead_intake::pipeline::{LeadPipeline, RecordBuilder};
use lead_intake::server::{router, AppState};
use lead_intake::store::auth::{ServiceAccountKey, TokenProvider, SHEETS_SCOPES};
use lead_intake::store::GoogleSheetsStore;
use lead_intake::validation::InputValidator;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file layered over config/default and config/local
    #[arg(short, long, env = "LEAD_INTAKE_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server
    Serve {
        /// Bind address, overriding configuration
        #[arg(long)]
        host: Option<String>,

        /// Bind port, overriding configuration and PORT
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Extract a lead record from text without writing it anywhere
    Parse {
        /// Notification text
        text: String,

        /// Assignee name
        #[arg(short, long)]
        assigned_to: Option<String>,

        /// Date to resolve relative dates against (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve { host: None, port: None }) {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;
            serve(config).await
        }
        Commands::Parse {
            text,
            assigned_to,
            today,
        } => parse(&text, assigned_to, today),
    }
}

/// Run the webhook server until ctrl-c
async fn serve(config: AppConfig) -> Result<()> {
    // Initialize logging
    let _log_guard = init_logging(
        Some(config.logging.level.as_str()),
        config.logging.file_path.as_deref(),
        config.json_logs(),
    )?;

    info!("Starting lead-intake webhook");

    let key = ServiceAccountKey::from_file(&config.sheets.credentials_path)?;
    info!(account = %key.client_email, "Loaded service account credentials");

    let auth_client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build HTTP client")?;
    let tokens = Arc::new(TokenProvider::new(key, auth_client, &SHEETS_SCOPES));
    let store = GoogleSheetsStore::new(tokens, config.spreadsheet_ref(), config.request_timeout())?;

    let router_rules = config.router();
    for rule in router_rules.rules() {
        info!(assignee = %rule.assignee, worksheet = %rule.worksheet, "Mirroring assignee leads");
    }

    let pipeline = LeadPipeline::new(Arc::new(store), router_rules, config.primary_selector())?;
    let state = Arc::new(AppState {
        pipeline,
        clock: Arc::new(SystemClock),
    });

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(address = %addr, "Listening for webhooks");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Print the record that would be written for `text`
#[allow(clippy::print_stdout)]
fn parse(text: &str, assigned_to: Option<String>, today: Option<NaiveDate>) -> Result<()> {
    let message = InboundMessage {
        raw_text: Some(text.to_string()),
        assigned_to,
    };
    let raw_text = InputValidator::require_raw_text(&message)?;
    let now = today.unwrap_or_else(|| SystemClock.today());

    let record = RecordBuilder::new()?.build(raw_text, message.assignee(), now)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
