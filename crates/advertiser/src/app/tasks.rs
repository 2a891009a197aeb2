use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::app::AdvertiserType;
use crate::app::Application;
use crate::config::DaemonArgs;
use crate::domain::advertiser::DeviceAdvertiser;
use crate::domain::traits::DeviceManager;
use crate::domain::traits::NodeClient;

/// Spawn the advertisement loop of `advertiser` with the cadence from `daemon_args`.
///
/// The loop never fails; it ends when `cancellation_token` is cancelled.
pub fn start_device_advertiser<C, D>(
    advertiser: Arc<DeviceAdvertiser<C, D>>,
    daemon_args: &DaemonArgs,
    cancellation_token: CancellationToken,
) -> JoinHandle<()>
where
    C: NodeClient + 'static,
    D: DeviceManager + 'static,
{
    let interval = daemon_args.advertise_interval();
    let retry_interval = daemon_args.retry_interval();

    tokio::spawn(async move {
        tracing::info!(node = advertiser.node_name(), "Starting device advertiser task");
        advertiser
            .advertise_loop(interval, retry_interval, cancellation_token)
            .await;
        tracing::info!("Device advertiser task completed");
    })
}

/// Task manager, responsible for starting and managing all background tasks
pub struct Tasks {
    pub tasks: Vec<JoinHandle<()>>,
    cancellation_token: CancellationToken,
}

impl Default for Tasks {
    fn default() -> Self {
        Self::new()
    }
}

impl Tasks {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start all background tasks
    pub fn spawn_all_tasks(&mut self, app: &Application) {
        let advertiser_task = self.spawn_advertiser_task(app.advertiser(), app.daemon_args());
        self.tasks.push(advertiser_task);
    }

    fn spawn_advertiser_task(
        &self,
        advertiser: &Arc<AdvertiserType>,
        daemon_args: &DaemonArgs,
    ) -> JoinHandle<()> {
        start_device_advertiser(
            advertiser.clone(),
            daemon_args,
            self.cancellation_token.clone(),
        )
    }

    /// wait for tasks to complete or receive shutdown signal
    pub async fn wait_for_completion(&mut self) -> Result<()> {
        if self.tasks.is_empty() {
            return Ok(());
        }

        let signal_handler = {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};
                let mut sigterm = signal(SignalKind::terminate())?;
                let mut sigint = signal(SignalKind::interrupt())?;

                tokio::spawn(async move {
                    tokio::select! {
                        _ = sigterm.recv() => {
                            tracing::info!("Received SIGTERM, initiating graceful shutdown");
                        }
                        _ = sigint.recv() => {
                            tracing::info!("Received SIGINT, initiating graceful shutdown");
                        }
                    }
                })
            }
            #[cfg(not(unix))]
            {
                tokio::spawn(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!("Failed to listen for Ctrl+C: {e}");
                        return;
                    }
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                })
            }
        };

        let shutdown_requested = tokio::select! {
            _ = signal_handler => true,
            result = futures::future::select_all(&mut self.tasks) => {
                let (result, _index, _remaining) = result;
                if let Err(e) = result {
                    tracing::error!("Task completed with error: {e}");
                    self.cancellation_token.cancel();
                    return Err(e.into());
                }
                tracing::warn!("Task completed unexpectedly");
                false
            }
        };

        self.cancellation_token.cancel();
        if shutdown_requested {
            tracing::info!("Shutdown signal received, cancelling all tasks");
            self.wait_for_tasks_with_timeout(Duration::from_secs(30)).await;
        }

        Ok(())
    }

    async fn wait_for_tasks_with_timeout(&mut self, timeout: Duration) {
        tokio::time::timeout(timeout, async {
            for task in &mut self.tasks {
                if let Err(e) = task.await {
                    tracing::error!("Task failed during shutdown: {e}");
                }
            }
        })
        .await
        .unwrap_or_else(|_| {
            tracing::warn!("Task shutdown timed out after {:?}", timeout);
        });
    }
}
