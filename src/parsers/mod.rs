pub mod ansi;
pub mod gosearch;
pub mod markers;

use serde::Serialize;

/// One profile extracted from a report line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformResult {
    pub name: String,
    pub url: String,
    /// Always true. Profiles that were not found are omitted, not reported as false.
    pub found: bool,
}

/// Trait for turning raw CLI stdout into structured results.
/// Parsing never fails: lines that can't be understood are skipped.
pub trait ReportParser: Send + Sync {
    fn parse(&self, stdout: &str) -> Vec<PlatformResult>;
}
