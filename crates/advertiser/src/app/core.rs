use std::sync::Arc;

use anyhow::Result;

use crate::app::tasks::Tasks;
use crate::app::AdvertiserType;
use crate::config::DaemonArgs;
use crate::infrastructure::host::NodeAddress;

/// Application core structure with explicit dependencies
pub struct Application {
    advertiser: Arc<AdvertiserType>,
    node_address: NodeAddress,
    daemon_args: DaemonArgs,
}

impl Application {
    pub fn new(
        advertiser: Arc<AdvertiserType>,
        node_address: NodeAddress,
        daemon_args: DaemonArgs,
    ) -> Self {
        Self {
            advertiser,
            node_address,
            daemon_args,
        }
    }

    pub fn advertiser(&self) -> &Arc<AdvertiserType> {
        &self.advertiser
    }

    pub fn daemon_args(&self) -> &DaemonArgs {
        &self.daemon_args
    }

    /// Run application, start all tasks and wait for completion
    pub async fn run(&self) -> Result<()> {
        tracing::info!(
            node = %self.node_address.hostname,
            ip = %self.node_address.ip,
            "Starting all application tasks..."
        );

        let mut tasks = Tasks::new();
        tasks.spawn_all_tasks(self);

        if let Err(e) = tasks.wait_for_completion().await {
            tracing::error!("Error during task execution: {}", e);
            return Err(e);
        }

        tracing::info!("Application run completed");
        Ok(())
    }
}
