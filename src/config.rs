use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::dispatch::install::BinaryLocator;
use crate::parsers::markers::MarkerTable;

pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;
pub const DEFAULT_PACKAGE: &str = "github.com/ibnaleem/gosearch@latest";

#[derive(Debug, Clone)]
pub struct InstallConfig {
    pub enabled: bool,
    pub package: String,
    pub retry_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub search_timeout: Duration,
    pub locator: BinaryLocator,
    pub install: InstallConfig,
    pub markers: MarkerTable,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup. Invalid values are logged and
    /// replaced by defaults; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = parse_or_default(get("PORT"), "PORT", DEFAULT_PORT);
        let bind_addr = parse_or_default(
            get("BIND_ADDR"),
            "BIND_ADDR",
            IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        );
        let timeout_secs = parse_or_default(
            get("GOSEARCH_TIMEOUT_SECS"),
            "GOSEARCH_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        );
        let retry_secs = parse_or_default(
            get("GOSEARCH_INSTALL_RETRY_SECS"),
            "GOSEARCH_INSTALL_RETRY_SECS",
            DEFAULT_RETRY_DELAY_SECS,
        );

        let install = InstallConfig {
            enabled: get("GOSEARCH_INSTALL").is_none_or(|v| parse_bool(&v)),
            package: get("GOSEARCH_PACKAGE").unwrap_or_else(|| DEFAULT_PACKAGE.to_string()),
            retry_delay: Duration::from_secs(retry_secs),
        };

        let locator = BinaryLocator {
            override_path: get("GOSEARCH_BIN").map(PathBuf::from),
            gobin: get("GOBIN").map(PathBuf::from),
            gopath: get("GOPATH"),
            go_program: None,
            skip_go_env: false,
            skip_path_lookup: false,
        };

        let markers = match get("GOSEARCH_MARKERS") {
            Some(path) => match MarkerTable::load(path.as_ref()) {
                Ok(table) => {
                    tracing::info!(path = %path, "loaded marker table");
                    table
                }
                Err(e) => {
                    tracing::warn!("{e} — using built-in marker table");
                    MarkerTable::default()
                }
            },
            None => MarkerTable::default(),
        };

        if timeout_secs == 0 {
            tracing::warn!("GOSEARCH_TIMEOUT_SECS=0 — every search will time out");
        }

        Config {
            bind_addr,
            port,
            search_timeout: Duration::from_secs(timeout_secs),
            locator,
            install,
            markers,
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse_or_default<T: std::str::FromStr>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("{key}={raw:?} is invalid — using default");
            default
        }),
    }
}

fn parse_bool(value: &str) -> bool {
    !matches!(
        value.to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
