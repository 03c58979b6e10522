//! Destinations for invocation results.

use async_trait::async_trait;
use tokio::io::{self, AsyncWrite, AsyncWriteExt, Stdout};

use super::InvocationResult;
use crate::errors::IngestError;

/// Receives the result of every successful invocation.
#[async_trait]
pub trait ResultSink: Send {
    async fn write_result(&mut self, result: &InvocationResult) -> Result<(), IngestError>;
}

/// Writes each result as one JSON line, e.g. `{"status":"ok","items":2}`.
pub struct JsonLineSink<W = Stdout> {
    writer: W,
}

impl JsonLineSink {
    /// Write results to the process's standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: AsyncWrite + Unpin> JsonLineSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ResultSink for JsonLineSink<W> {
    async fn write_result(&mut self, result: &InvocationResult) -> Result<(), IngestError> {
        let mut line = serde_json::to_string(result)?;
        line.push('\n');

        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| IngestError::sink(e.to_string()))?;
        self.writer
            .flush()
            .await
            .map_err(|e| IngestError::sink(e.to_string()))
    }
}
