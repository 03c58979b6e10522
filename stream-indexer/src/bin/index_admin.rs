//! Operator tool for creating, verifying and deleting the search indices.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use stream_indexer::{IndexerConfig, LoggingConfig};
use stream_indexer_repository::{IndexAdmin, OpenSearchTransport, UnsignedRequests};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "index-admin")]
#[command(about = "Create, verify or delete the stream indexer's search indices", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Target the discovery tag index instead of the primary index
    #[arg(long, global = true)]
    tags: bool,

    /// Index name, overriding AOSS_INDEX / AOSS_TAG_INDEX
    #[arg(long, global = true)]
    index: Option<String>,

    /// Signing region, overriding AWS_REGION / AWS_DEFAULT_REGION
    #[arg(short, long, global = true)]
    region: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the index with the fixed mapping
    Create,
    /// Check that the index exists
    Verify,
    /// Delete the index and all of its documents
    Delete,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let logging = LoggingConfig::from_env();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(logging.filter_directive())),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = IndexerConfig::from_env().context("Failed to load configuration")?;
    if let Some(region) = cli.region.clone() {
        config.region = Some(region);
    }

    let index = match cli.index {
        Some(index) => index,
        None if cli.tags => config.indices.tag_index.clone(),
        None => config.indices.primary_index.clone(),
    };

    let transport = OpenSearchTransport::new(
        &config.endpoint,
        Arc::new(UnsignedRequests),
        &config.signing_service,
        config.region.clone(),
    )
    .context("Failed to create search transport")?;
    let admin = IndexAdmin::new(Arc::new(transport));

    let (operation, result) = match cli.command {
        Commands::Create => ("create", admin.create_index(&index).await),
        Commands::Verify => ("verify", admin.verify_index(&index).await),
        Commands::Delete => ("delete", admin.delete_index(&index).await),
    };

    match result {
        Ok(report) => {
            info!(operation = operation, index = %report.index, status = report.status, "Done");
            println!("{} {}: ok (status {})", operation, report.index, report.status);
            Ok(())
        }
        Err(e) => {
            error!(operation = operation, index = %index, error = %e, "Failed");
            Err(e).with_context(|| format!("Failed to {} index '{}'", operation, index))
        }
    }
}
