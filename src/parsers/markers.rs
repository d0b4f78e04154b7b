use std::path::Path;

use serde::Deserialize;

use crate::error::ProxyError;

/// Default result markers.
pub const FOUND_MARKERS: &[&str] = &["[+]"];
pub const LIKELY_MARKERS: &[&str] = &["[?]"];

/// Line starts that mark banners, separators, box borders, and info output.
pub const NOISE_PREFIXES: &[&str] = &[
    "::", "[*]", "[-]", "[!]", "[i]", "==", "--", "##", "⎯", "─", "━", "═", "│", "┃", "║", "┌",
    "┐", "└", "┘", "╭", "╮", "╰", "╯", "╔", "╗", "╚", "╝", "▔", "▁",
];

/// Summary lines, matched anywhere in the line.
pub const SUMMARY_PHRASES: &[&str] = &["Number of profiles found", "Total time taken"];

/// One noise predicate. Rules are checked in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoiseRule {
    Prefix(String),
    Contains(String),
}

impl NoiseRule {
    pub fn matches(&self, line: &str) -> bool {
        match self {
            Self::Prefix(p) => line.starts_with(p.as_str()),
            Self::Contains(s) => line.contains(s.as_str()),
        }
    }
}

/// Which marker a candidate line carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Found,
    Likely,
}

/// The marker and noise vocabulary of a gosearch report.
///
/// gosearch does not document its output, so this table is data: the
/// defaults match observed output and a TOML file can replace any part.
#[derive(Debug, Clone)]
pub struct MarkerTable {
    found: Vec<String>,
    likely: Vec<String>,
    noise: Vec<NoiseRule>,
}

/// On-disk shape. Missing keys keep the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct MarkerFile {
    found: Option<Vec<String>>,
    likely: Option<Vec<String>>,
    noise_prefixes: Option<Vec<String>>,
    summary_phrases: Option<Vec<String>>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for MarkerTable {
    fn default() -> Self {
        Self::build(
            owned(FOUND_MARKERS),
            owned(LIKELY_MARKERS),
            owned(NOISE_PREFIXES),
            owned(SUMMARY_PHRASES),
        )
    }
}

impl MarkerTable {
    fn build(
        found: Vec<String>,
        likely: Vec<String>,
        noise_prefixes: Vec<String>,
        summary_phrases: Vec<String>,
    ) -> Self {
        let noise = noise_prefixes
            .into_iter()
            .map(NoiseRule::Prefix)
            .chain(summary_phrases.into_iter().map(NoiseRule::Contains))
            .collect();
        Self {
            found,
            likely,
            noise,
        }
    }

    /// Parse a TOML marker table, falling back to defaults per key.
    pub fn from_toml_str(text: &str) -> Result<Self, ProxyError> {
        let file: MarkerFile = toml::from_str(text)
            .map_err(|e| ProxyError::Config(format!("marker table: {e}")))?;

        let table = Self::build(
            file.found.unwrap_or_else(|| owned(FOUND_MARKERS)),
            file.likely.unwrap_or_else(|| owned(LIKELY_MARKERS)),
            file.noise_prefixes.unwrap_or_else(|| owned(NOISE_PREFIXES)),
            file.summary_phrases.unwrap_or_else(|| owned(SUMMARY_PHRASES)),
        );
        table.validate()?;
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self, ProxyError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ProxyError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Reject tables that would misclassify every line.
    pub fn validate(&self) -> Result<(), ProxyError> {
        if self.found.is_empty() {
            return Err(ProxyError::Config(
                "marker table: at least one found marker is required".to_string(),
            ));
        }
        let empty_marker = self.found.iter().chain(&self.likely).any(String::is_empty);
        let empty_rule = self.noise.iter().any(|rule| match rule {
            NoiseRule::Prefix(s) | NoiseRule::Contains(s) => s.is_empty(),
        });
        if empty_marker || empty_rule {
            return Err(ProxyError::Config(
                "marker table: entries must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_noise(&self, line: &str) -> bool {
        self.noise.iter().any(|rule| rule.matches(line))
    }

    /// Match a result marker at the start of `line`, returning its kind and
    /// the text after it. Found markers take precedence over likely ones.
    pub fn match_marker<'a>(&self, line: &'a str) -> Option<(MarkerKind, &'a str)> {
        let found = self
            .found
            .iter()
            .find_map(|m| line.strip_prefix(m.as_str()))
            .map(|rest| (MarkerKind::Found, rest));

        found.or_else(|| {
            self.likely
                .iter()
                .find_map(|m| line.strip_prefix(m.as_str()))
                .map(|rest| (MarkerKind::Likely, rest))
        })
    }

    pub fn noise_rules(&self) -> &[NoiseRule] {
        &self.noise
    }
}
