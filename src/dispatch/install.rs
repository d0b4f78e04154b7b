use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::config::InstallConfig;
use crate::error::ProxyError;

pub const BINARY_NAME: &str = "gosearch";

/// Finds the gosearch executable.
///
/// Candidates, in order: explicit override, `$GOBIN`, each `$GOPATH` entry,
/// `go env GOPATH`, then `PATH`. The first existing file wins. Resolution runs
/// per request so a binary installed after startup is picked up.
///
/// The `go env` and `which` lookups have no limit of their own; callers bound
/// `locate()` with the request deadline.
#[derive(Debug, Clone, Default)]
pub struct BinaryLocator {
    pub override_path: Option<PathBuf>,
    pub gobin: Option<PathBuf>,
    pub gopath: Option<String>,
    /// Toolchain used for `go env GOPATH`; `go` on PATH when unset.
    pub go_program: Option<PathBuf>,
    /// Skip the `go env GOPATH` fallback (tests, hosts without a Go toolchain).
    pub skip_go_env: bool,
    /// Skip the final PATH lookup.
    pub skip_path_lookup: bool,
}

impl BinaryLocator {
    /// Candidate paths from configuration alone, without running anything.
    pub fn configured_candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(path) = &self.override_path {
            candidates.push(path.clone());
        }
        if let Some(gobin) = &self.gobin {
            candidates.push(gobin.join(BINARY_NAME));
        }
        if let Some(gopath) = &self.gopath {
            candidates.extend(
                std::env::split_paths(gopath)
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(|p| p.join("bin").join(BINARY_NAME)),
            );
        }
        candidates
    }

    pub async fn locate(&self) -> Result<PathBuf, ProxyError> {
        let mut searched = self.configured_candidates();
        if let Some(found) = searched.iter().find(|p| is_executable_file(p)) {
            return Ok(found.clone());
        }

        if !self.skip_go_env
            && let Some(gopath) = go_env_gopath(self.go_program.as_deref()).await
        {
            let candidate = gopath.join("bin").join(BINARY_NAME);
            if is_executable_file(&candidate) {
                return Ok(candidate);
            }
            searched.push(candidate);
        }

        if !self.skip_path_lookup
            && let Some(path) = which(BINARY_NAME).await
        {
            return Ok(path);
        }

        Err(ProxyError::BinaryNotFound { searched })
    }
}

fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

/// `go env GOPATH`, or None when Go is missing or prints nothing.
async fn go_env_gopath(program: Option<&Path>) -> Option<PathBuf> {
    let output = Command::new(program.unwrap_or(Path::new("go")))
        .args(["env", "GOPATH"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    // GOPATH may be a list; binaries are installed under the first entry.
    let text = String::from_utf8_lossy(&output.stdout);
    std::env::split_paths(text.trim()).find(|p| !p.as_os_str().is_empty())
}

/// Look up an executable on PATH.
async fn which(name: &str) -> Option<PathBuf> {
    let output = Command::new("which")
        .arg(name)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let path = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
    is_executable_file(&path).then_some(path)
}

/// Runs `go install <package>` with the inherited environment, so
/// deployment-provided GOBIN/GOPATH decide where the binary lands.
#[derive(Debug, Clone)]
pub struct Installer {
    program: PathBuf,
    package: String,
}

impl Installer {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            program: PathBuf::from("go"),
            package: package.into(),
        }
    }

    /// Use a different toolchain executable (invoked as `<program> install <package>`).
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub async fn install(&self) -> Result<(), ProxyError> {
        let status = Command::new(&self.program)
            .args(["install", self.package.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| {
                ProxyError::Install(format!("failed to start {}: {e}", self.program.display()))
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ProxyError::Install(format!(
                "{} install {} exited with code {}",
                self.program.display(),
                self.package,
                status.code().unwrap_or(-1)
            )))
        }
    }

    /// One attempt, then exactly one retry after `retry_delay`.
    /// Returns the last error; callers log it and keep serving.
    pub async fn install_with_retry(&self, retry_delay: Duration) -> Result<(), ProxyError> {
        tracing::info!(package = %self.package, "installing gosearch (this may take a moment)");
        let Err(first) = self.install().await else {
            tracing::info!("gosearch installed");
            return Ok(());
        };

        tracing::warn!(
            "initial install failed: {first}; retrying in {}ms",
            retry_delay.as_millis()
        );
        tokio::time::sleep(retry_delay).await;

        self.install().await.inspect(|_| tracing::info!("gosearch installed on retry"))
    }
}

impl From<&InstallConfig> for Installer {
    fn from(config: &InstallConfig) -> Self {
        Self::new(config.package.clone())
    }
}
