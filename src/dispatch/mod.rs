pub mod cli;
pub mod install;

use std::time::{Duration, Instant};

use crate::dispatch::cli::CliDispatch;
use crate::dispatch::install::BinaryLocator;
use crate::error::ProxyError;

/// One captured gosearch run for one username. Never mutated after capture.
#[derive(Debug, Clone)]
pub struct Report {
    pub username: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Turns a username into a [`Report`] by running gosearch under a time limit.
#[derive(Debug, Clone)]
pub struct GosearchRunner {
    locator: BinaryLocator,
    dispatch: CliDispatch,
    timeout: Duration,
}

impl GosearchRunner {
    pub fn new(locator: BinaryLocator, timeout: Duration) -> Self {
        Self {
            locator,
            dispatch: CliDispatch::new(),
            timeout,
        }
    }

    /// Timeouts and spawn failures are errors; a non-zero exit is not.
    /// gosearch often exits non-zero after printing partial results.
    ///
    /// Binary lookup and the search itself share one time limit.
    pub async fn run(&self, username: &str) -> Result<Report, ProxyError> {
        let start = Instant::now();
        let deadline = start + self.timeout;

        let executable = tokio::time::timeout(self.timeout, self.locator.locate())
            .await
            .map_err(|_| ProxyError::Timeout(start.elapsed().as_millis() as u64))??;

        let remaining = deadline.saturating_duration_since(Instant::now());
        let args = ["-u".to_string(), username.to_string()];
        let output = self.dispatch.run(&executable, &args, remaining).await?;

        tracing::debug!(
            username,
            exit_code = output.exit_code,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "gosearch finished"
        );

        Ok(Report {
            username: username.to_string(),
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
