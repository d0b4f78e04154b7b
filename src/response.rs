use serde::Serialize;

use crate::dispatch::Report;
use crate::parsers::PlatformResult;

/// Body of a successful `/search` response. Returned with 200 whatever the
/// tool's own exit code was.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub username: String,
    pub exit_code: i32,
    pub results: Vec<PlatformResult>,
    pub stdout: String,
    pub stderr: String,
}

impl SearchResponse {
    pub fn new(report: Report, results: Vec<PlatformResult>) -> Self {
        Self {
            username: report.username,
            exit_code: report.exit_code,
            results,
            stdout: report.stdout,
            stderr: report.stderr,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
