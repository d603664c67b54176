use crate::toolchain::{DeviceCtl, ToolPathResolver};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use xcpilot_api::{CommandRequest, CommandRunner, Installation};

/// Attaches to an app's console through `devicectl`.
///
/// Streaming is a side channel: it never reports failure to its caller.
#[derive(Clone)]
pub struct LogStreamer {
    runner: Arc<dyn CommandRunner>,
    tools: Arc<ToolPathResolver>,
    timeout: Duration,
}

impl LogStreamer {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        tools: Arc<ToolPathResolver>,
        timeout: Duration,
    ) -> Self {
        Self {
            runner,
            tools,
            timeout,
        }
    }

    /// Stream until the console command exits or `timeout` (default from config) expires.
    pub async fn stream(
        &self,
        coredevice_id: &str,
        bundle_id: &str,
        installation: Option<&Installation>,
        timeout: Option<Duration>,
    ) {
        let devicectl = self.tools.resolve(installation).await;
        let command = DeviceCtl::new(&devicectl).console(coredevice_id, bundle_id);
        let request = CommandRequest::new(command).with_timeout(timeout.unwrap_or(self.timeout));

        match self.runner.execute(request).await {
            Ok(out) => info!(
                "Console stream for {} ended ({} bytes)",
                bundle_id,
                out.stdout.len()
            ),
            // The console command never exits on its own.
            Err(e) if e.is_timeout() => info!("Console stream for {} reached its time limit", bundle_id),
            Err(e) => warn!("Console stream for {} failed: {}", bundle_id, e),
        }
    }

    /// Start streaming on a detached task.
    ///
    /// The handle is only useful for observing completion; dropping it does not stop the stream.
    pub fn spawn(
        &self,
        coredevice_id: String,
        bundle_id: String,
        installation: Option<Installation>,
        timeout: Option<Duration>,
    ) -> JoinHandle<()> {
        let streamer = self.clone();
        tokio::spawn(async move {
            streamer
                .stream(&coredevice_id, &bundle_id, installation.as_ref(), timeout)
                .await;
        })
    }
}
