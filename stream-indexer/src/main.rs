//! Stream Indexer Main Entry Point
//!
//! Reads stream events (one JSON object per line) from standard input,
//! indexes them, and writes one result line per event to standard output.

use dotenv::dotenv;
use stream_indexer::consumer::StdinEventSource;
use stream_indexer::orchestrator::JsonLineSink;
use stream_indexer::{Dependencies, IndexingError, LogFormat, LoggingConfig};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
///
/// Logs go to stderr so stdout carries only invocation results.
fn init_tracing(logging: &LoggingConfig) -> Result<(), IndexingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter_directive()));

    match logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_thread_ids(true),
                )
                .try_init()
                .map_err(|e| IndexingError::config(format!("Failed to init tracing: {}", e)))?;

            info!(
                service_name = "stream-indexer",
                service_version = env!("CARGO_PKG_VERSION"),
                "Tracing initialized with JSON format"
            );
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .pretty(),
                )
                .try_init()
                .map_err(|e| IndexingError::config(format!("Failed to init tracing: {}", e)))?;

            info!(
                service_name = "stream-indexer",
                service_version = env!("CARGO_PKG_VERSION"),
                "Tracing initialized with console output"
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing(&LoggingConfig::from_env())?;

    info!("Starting stream indexer");

    let deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let mut source = StdinEventSource::stdin();
    let mut sink = JsonLineSink::stdout();

    match deps.orchestrator.run(&mut source, &mut sink).await {
        Ok(summary) => {
            info!(
                invocations = summary.invocations,
                items_indexed = summary.items_indexed,
                "Stream indexer completed successfully"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Stream indexer failed");
            Err(e.into())
        }
    }
}
