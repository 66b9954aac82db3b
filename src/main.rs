use clap::{Parser, Subcommand};
use donation_flow::application::coordinator::DonationCoordinator;
use donation_flow::application::registry::VerificationRegistry;
use donation_flow::config::Config;
use donation_flow::domain::donation::DonationAmount;
use donation_flow::domain::ports::CorrelationStoreBox;
use donation_flow::infrastructure::http::HttpDonationGateway;
use donation_flow::infrastructure::in_memory::{InMemoryCampaignTotals, InMemoryCorrelationStore};
use donation_flow::infrastructure::opener::CommandOpener;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the donation backend (overrides DONATION_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a donation and open the payment page
    Initiate {
        #[arg(long)]
        campaign: String,
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "")]
        message: String,
    },
    /// Check whether a payment has settled
    Verify { pidx: String },
    /// Verify the payment left over from a previous initiation, if any
    Resume,
    /// Show the donation history of the authenticated user
    History,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env().into_diagnostic()?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    if let Some(db_path) = cli.db_path {
        config.db_path = Some(db_path);
    }

    let coordinator = DonationCoordinator::new(
        Box::new(HttpDonationGateway::from_config(&config).into_diagnostic()?),
        correlation_store(&config)?,
        Box::new(InMemoryCampaignTotals::new()),
        Box::new(CommandOpener::new(config.opener.clone())),
    )
    .with_registry(Arc::new(VerificationRegistry::new(
        config.max_verify_attempts,
    )));

    match cli.command {
        Command::Initiate {
            campaign,
            amount,
            message,
        } => {
            let amount: DonationAmount = amount.parse().into_diagnostic()?;
            let outcome = coordinator
                .initiate(&campaign, amount.value(), &message)
                .await
                .into_diagnostic()?;
            if outcome.redirect_blocked() {
                eprintln!(
                    "Could not open the payment page. Continue manually at: {}",
                    outcome.payload.payment_url
                );
            }
            print_json(&outcome)?;
        }
        Command::Verify { pidx } => {
            let outcome = coordinator.verify(&pidx).await.into_diagnostic()?;
            print_json(&outcome)?;
        }
        Command::Resume => {
            let summary = coordinator
                .check_pending_donation()
                .await
                .into_diagnostic()?;
            print_json(&summary)?;
        }
        Command::History => {
            let donations = coordinator.refresh_history().await.into_diagnostic()?;
            print_json(&donations)?;
        }
    }

    Ok(())
}

fn correlation_store(config: &Config) -> Result<CorrelationStoreBox> {
    match &config.db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            use donation_flow::infrastructure::rocksdb::RocksDbCorrelationStore;
            let store = RocksDbCorrelationStore::open(path).into_diagnostic()?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Box::new(InMemoryCorrelationStore::new()))
        }
        None => Ok(Box::new(InMemoryCorrelationStore::new())),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}
