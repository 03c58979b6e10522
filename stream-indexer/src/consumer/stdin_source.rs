//! Event source reading newline-delimited stream events.

use async_trait::async_trait;
use stream_indexer_shared::StreamEvent;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

use super::EventSource;
use crate::errors::IngestError;

/// Reads one JSON stream event per line.
///
/// Blank lines are ignored. A line that is not a stream event is a parse
/// error carrying its line number.
///
/// ```text
/// {"Records":[{"eventName":"REMOVE","dynamodb":{"Keys":{"pk":{"S":"user1"},"sk":{"S":"save1"}}}}]}
/// ```
pub struct StdinEventSource<R = BufReader<Stdin>> {
    lines: Lines<R>,
    line_number: u64,
}

impl StdinEventSource {
    /// Read events from the process's standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> StdinEventSource<R> {
    /// Read events from any buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> EventSource for StdinEventSource<R> {
    async fn next_event(&mut self) -> Result<Option<StreamEvent>, IngestError> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }

            let event: StreamEvent = serde_json::from_str(&line).map_err(|e| {
                IngestError::parse(format!("line {}: {}", self.line_number, e))
            })?;
            debug!(
                line = self.line_number,
                record_count = event.records.len(),
                "Read stream event"
            );
            return Ok(Some(event));
        }

        Ok(None)
    }
}
