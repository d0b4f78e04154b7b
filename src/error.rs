use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("username query param is required")]
    MissingUsername,

    #[error("invalid username: {0}")]
    InvalidUsername(String),

    #[error("gosearch binary not found (searched {} locations)", searched.len())]
    BinaryNotFound { searched: Vec<PathBuf> },

    #[error("failed to spawn gosearch: {0}")]
    Spawn(String),

    #[error("timeout after {0}ms")]
    Timeout(u64),

    #[error("{stream} exceeded {limit} bytes")]
    OutputTooLarge { stream: &'static str, limit: usize },

    #[error("io error: {0}")]
    Io(String),

    #[error("install failed: {0}")]
    Install(String),

    #[error("config error: {0}")]
    Config(String),
}

impl ProxyError {
    /// True when the caller sent a bad request. Everything else is a
    /// failure to acquire the report.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingUsername | Self::InvalidUsername(_))
    }

    /// Message returned in the HTTP error body.
    /// Search paths are not echoed back, only counted.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingUsername => "username query param is required".to_string(),
            Self::InvalidUsername(reason) => format!("invalid username: {reason}"),
            Self::BinaryNotFound { .. } => {
                "failed to run gosearch: binary not found (install may still be pending)"
                    .to_string()
            }
            Self::Spawn(msg) => format!("failed to run gosearch: {msg}"),
            Self::Timeout(ms) => format!("failed to run gosearch: timed out after {ms}ms"),
            Self::OutputTooLarge { stream, limit } => {
                format!("failed to run gosearch: {stream} exceeded {limit} bytes")
            }
            Self::Io(msg) => format!("failed to run gosearch: {msg}"),
            Self::Install(msg) => format!("gosearch install failed: {msg}"),
            Self::Config(msg) => format!("configuration error: {msg}"),
        }
    }
}

/// Validate and normalize a username from the query string.
///
/// The value is passed to gosearch as the single argv entry after `-u`, so
/// any non-empty text is accepted as-is, leading `-` included.
pub fn validate_username(raw: Option<&str>) -> Result<String, ProxyError> {
    let username = raw.map(str::trim).unwrap_or_default();
    if username.is_empty() {
        return Err(ProxyError::MissingUsername);
    }
    if username.chars().any(char::is_control) {
        return Err(ProxyError::InvalidUsername(
            "must not contain control characters".to_string(),
        ));
    }
    Ok(username.to_string())
}
