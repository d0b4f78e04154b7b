use crate::parsers::ansi::strip_ansi;
use crate::parsers::markers::{MarkerKind, MarkerTable};
use crate::parsers::{PlatformResult, ReportParser};

/// URL scheme prefix every extracted profile link must start with.
const URL_PREFIX: &str = "http";

/// Why a line produced no record and was not worth a second look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Blank,
    Noise,
    /// No result marker, or a marker with no URL on the line.
    NotACandidate,
}

/// Why a candidate line (marker + `http`) could not be split into name/URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    MissingColon,
    EmptyName,
    NotAUrl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Skipped(SkipReason),
    Malformed(Malformed),
    Record {
        result: PlatformResult,
        marker: MarkerKind,
    },
}

/// Parses the plain-text, colour-coded report gosearch prints to stdout.
///
/// Lines are classified independently; there is no state between lines.
#[derive(Debug, Clone, Default)]
pub struct GosearchParser {
    markers: MarkerTable,
}

impl GosearchParser {
    pub fn new(markers: MarkerTable) -> Self {
        Self { markers }
    }

    pub fn classify_line(&self, raw: &str) -> LineOutcome {
        let stripped = strip_ansi(raw);
        let line = stripped.trim();

        if line.is_empty() {
            return LineOutcome::Skipped(SkipReason::Blank);
        }
        if self.markers.is_noise(line) {
            return LineOutcome::Skipped(SkipReason::Noise);
        }

        let Some((marker, payload)) = self.markers.match_marker(line) else {
            return LineOutcome::Skipped(SkipReason::NotACandidate);
        };
        if !line.contains(URL_PREFIX) {
            return LineOutcome::Skipped(SkipReason::NotACandidate);
        }

        let Some((name, rest)) = payload.trim().split_once(':') else {
            return LineOutcome::Malformed(Malformed::MissingColon);
        };
        let (name, url) = (name.trim(), rest.trim());

        // A colon inside the site name leaves the URL without its scheme.
        if !url.starts_with(URL_PREFIX) {
            return LineOutcome::Malformed(Malformed::NotAUrl);
        }
        if name.is_empty() {
            return LineOutcome::Malformed(Malformed::EmptyName);
        }

        LineOutcome::Record {
            result: PlatformResult {
                name: name.to_string(),
                url: url.to_string(),
                found: true,
            },
            marker,
        }
    }
}

impl ReportParser for GosearchParser {
    fn parse(&self, stdout: &str) -> Vec<PlatformResult> {
        stdout
            .lines()
            .filter_map(|line| match self.classify_line(line) {
                LineOutcome::Record { result, .. } => Some(result),
                LineOutcome::Skipped(_) | LineOutcome::Malformed(_) => None,
            })
            .collect()
    }
}
