use super::security::check_command;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use xcpilot_api::{CommandOutput, CommandRequest, CommandRunner, PilotError, Result};

/// Time a timed-out process group gets between SIGTERM and SIGKILL.
#[cfg(unix)]
const KILL_GRACE: Duration = Duration::from_secs(2);

/// Runs commands through `/bin/sh -c`.
///
/// Output is buffered in full; build logs can be large and truncating them hides the
/// error that matters. On Unix each command runs in its own process group, so a
/// timeout takes down everything the shell started, not just the shell.
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor;

impl ShellExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ShellExecutor {
    async fn execute(&self, request: CommandRequest) -> Result<CommandOutput> {
        check_command(&request.command)?;

        info!(
            command = %request.command,
            working_dir = ?request.working_dir,
            "Executing command"
        );

        let mut cmd = Command::new("/bin/sh");
        cmd.arg("-c")
            .arg(&request.command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &request.working_dir {
            cmd.current_dir(dir);
        }
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn()?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let waited = tokio::time::timeout(request.timeout, child.wait()).await;
        let status = match waited {
            Ok(status) => status?,
            Err(_) => {
                debug!(command = %request.command, "Command timed out");
                if let Err(e) = kill_group(&mut child).await {
                    warn!(command = %request.command, "Failed to kill timed-out command: {}", e);
                }
                stdout.abort();
                stderr.abort();
                return Err(PilotError::Timeout {
                    command: request.command,
                    timeout_ms: request.timeout.as_millis() as u64,
                });
            }
        };

        let stdout = collect(stdout).await;
        let stderr = collect(stderr).await;

        if !status.success() {
            return Err(PilotError::Process {
                command: request.command,
                code: status.code(),
                stdout,
                stderr,
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

fn drain<R>(stream: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut stream) = stream {
            if let Err(e) = stream.read_to_end(&mut buf).await {
                debug!("Reading command output failed: {}", e);
            }
        }
        buf
    })
}

async fn collect(handle: JoinHandle<Vec<u8>>) -> String {
    let bytes = handle.await.unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// SIGTERM the whole process group, then SIGKILL it if it outlives the grace period.
#[cfg(unix)]
async fn kill_group(child: &mut Child) -> std::io::Result<()> {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return Ok(());
    };
    let pgid = Pid::from_raw(pid as i32);
    let _ = killpg(pgid, Signal::SIGTERM);

    tokio::select! {
        () = tokio::time::sleep(KILL_GRACE) => {
            let _ = killpg(pgid, Signal::SIGKILL);
            child.wait().await.map(|_| ())
        }
        result = child.wait() => {
            // The shell is gone but its children may have ignored SIGTERM
            let _ = killpg(pgid, Signal::SIGKILL);
            result.map(|_| ())
        }
    }
}

#[cfg(not(unix))]
async fn kill_group(child: &mut Child) -> std::io::Result<()> {
    child.kill().await
}
