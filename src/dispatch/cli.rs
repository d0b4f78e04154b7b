use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::error::ProxyError;

pub const MAX_OUTPUT_BYTES: usize = 2 * 1024 * 1024; // 2MB

/// What a finished subprocess left behind.
#[derive(Debug)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code, or -1 when it was terminated by a signal.
    pub exit_code: i32,
}

impl CapturedOutput {
    fn from_parts(stdout: &[u8], stderr: &[u8], status: ExitStatus) -> Self {
        Self {
            stdout: String::from_utf8_lossy(stdout).into_owned(),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
            exit_code: status.code().unwrap_or(-1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CliDispatch {
    max_output_bytes: usize,
}

impl Default for CliDispatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Read at most `limit + 1` bytes so a breach is detectable.
async fn read_capped<R: AsyncRead + Unpin>(pipe: R, limit: usize, stream: &'static str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(limit.min(64 * 1024));
    let mut capped = pipe.take(limit as u64 + 1);
    if let Err(e) = capped.read_to_end(&mut buf).await {
        tracing::warn!(stream, "pipe read error: {e}");
    }
    buf
}

fn kill_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        // SAFETY: signalling a process group we created; a stale pgid only yields ESRCH.
        unsafe {
            libc::kill(-(pid as i32), libc::SIGKILL);
        }
    }
}

impl CliDispatch {
    pub fn new() -> Self {
        Self {
            max_output_bytes: MAX_OUTPUT_BYTES,
        }
    }

    pub fn with_max_output_bytes(max_output_bytes: usize) -> Self {
        Self { max_output_bytes }
    }

    /// Run `executable` with `args` and capture its output.
    ///
    /// - No shell: args go straight to argv
    /// - Child leads its own process group, killed as a group on timeout or cap breach
    /// - kill_on_drop(true) so an abandoned request never leaves a zombie
    /// - A non-zero exit is not an error; the caller gets the code and whatever was printed
    pub async fn run(
        &self,
        executable: &Path,
        args: &[String],
        timeout: Duration,
    ) -> Result<CapturedOutput, ProxyError> {
        let start = Instant::now();
        let limit = self.max_output_bytes;

        let mut cmd = Command::new(executable);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| ProxyError::Spawn(format!("{}: {e}", executable.display())))?;

        let child_pid = child.id();
        let (Some(stdout_pipe), Some(stderr_pipe)) = (child.stdout.take(), child.stderr.take())
        else {
            kill_group(child_pid);
            return Err(ProxyError::Io("child pipes were not captured".to_string()));
        };

        let read_future = async {
            let mut stdout_handle =
                tokio::spawn(async move { read_capped(stdout_pipe, limit, "stdout").await });
            let mut stderr_handle =
                tokio::spawn(async move { read_capped(stderr_pipe, limit, "stderr").await });

            // Whichever stream finishes first: if it hit the cap, the child may
            // be blocked on the other pipe. Kill the group so both readers see EOF.
            let (stdout_buf, stderr_buf) = tokio::select! {
                result = &mut stdout_handle => {
                    let buf = result.unwrap_or_default();
                    if buf.len() > limit {
                        kill_group(child_pid);
                    }
                    (buf, stderr_handle.await.unwrap_or_default())
                }
                result = &mut stderr_handle => {
                    let buf = result.unwrap_or_default();
                    if buf.len() > limit {
                        kill_group(child_pid);
                    }
                    (stdout_handle.await.unwrap_or_default(), buf)
                }
            };
            if stdout_buf.len() > limit || stderr_buf.len() > limit {
                kill_group(child_pid);
            }
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((stdout_buf, stderr_buf, status))
        };

        let (stdout, stderr, status) = match tokio::time::timeout(timeout, read_future).await {
            Ok(result) => result.map_err(|e| {
                ProxyError::Io(format!("failed to read from {}: {e}", executable.display()))
            })?,
            Err(_) => {
                kill_group(child_pid);
                return Err(ProxyError::Timeout(start.elapsed().as_millis() as u64));
            }
        };

        if stdout.len() > limit {
            return Err(ProxyError::OutputTooLarge {
                stream: "stdout",
                limit,
            });
        }
        if stderr.len() > limit {
            return Err(ProxyError::OutputTooLarge {
                stream: "stderr",
                limit,
            });
        }

        let output = CapturedOutput::from_parts(&stdout, &stderr, status);
        if output.exit_code != 0 {
            tracing::warn!(
                executable = %executable.display(),
                code = output.exit_code,
                "CLI process exited non-zero"
            );
        }
        if !output.stderr.is_empty() {
            tracing::debug!(executable = %executable.display(), stderr = %output.stderr, "CLI stderr output");
        }

        Ok(output)
    }
}
