//! Bounded invocation of a [`DocumentParser`]

use crate::error::{Error, Result};
use crate::pdf::document::ParsedDocument;
use crate::pdf::engine::DocumentParser;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Default time allowed for a single parse
pub const DEFAULT_PARSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs a parser on the blocking pool and races its outcome against a timer.
///
/// Exactly one of {document, engine error, timeout} is observed per call.
/// The parser reports through a one-shot channel; once the timer wins the
/// receiver is dropped and a late report is discarded.
#[derive(Clone)]
pub struct ParseInvoker {
    parser: Arc<dyn DocumentParser>,
    timeout: Duration,
}

impl ParseInvoker {
    pub fn new(parser: Arc<dyn DocumentParser>) -> Self {
        Self::with_timeout(parser, DEFAULT_PARSE_TIMEOUT)
    }

    pub fn with_timeout(parser: Arc<dyn DocumentParser>, timeout: Duration) -> Self {
        Self { parser, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Parse the file at `path`. The path must already be validated.
    pub async fn parse(&self, path: &Path) -> Result<ParsedDocument> {
        let (tx, rx) = oneshot::channel();
        let parser = Arc::clone(&self.parser);
        let path_buf = path.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let outcome = parser.parse(&path_buf);
            if tx.send(outcome).is_err() {
                tracing::debug!(
                    path = %path_buf.display(),
                    "parse finished after timeout, result dropped"
                );
            }
        });

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            // Sender dropped without reporting: the parser panicked
            Ok(Err(_)) => Err(Error::ParseEngine {
                reason: "parser terminated without producing a result".to_string(),
            }),
            Err(_) => {
                tracing::warn!(
                    path = %path.display(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "parse timed out"
                );
                Err(Error::ParseTimeout {
                    timeout: self.timeout,
                })
            }
        }
    }
}
