use std::path::PathBuf;
use std::time::Duration;

use api_types::NodeInfo;
use error_stack::Report;
use k8s_openapi::api::core::v1::Node;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use tokio::select;
use tokio::time::interval_at;
use tokio::time::Instant;
use tokio::time::Interval;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::state::AdvertiserState;
use super::traits::DeviceManager;
use super::traits::NodeClient;
use crate::infrastructure::k8s::annotations;
use crate::infrastructure::k8s::AdvertiseError;
use crate::infrastructure::k8s::KubeNodeClient;
use crate::infrastructure::k8s::PatchOutcome;
use crate::infrastructure::kube_client;

const DECIMAL_SUFFIXES: [&str; 7] = ["", "k", "M", "G", "T", "P", "E"];

/// Keeps the device resources of the node record in sync with local hardware.
///
/// A single loop task owns the advertiser, so patch attempts never overlap.
pub struct DeviceAdvertiser<C, D> {
    node_name: String,
    device_manager: D,
    client: C,
}

impl<D: DeviceManager> DeviceAdvertiser<KubeNodeClient, D> {
    /// Create an advertiser talking to the cluster described by `kubeconfig`.
    ///
    /// # Errors
    ///
    /// - [`AdvertiseError::Configuration`] if the client cannot be constructed
    pub async fn connect(
        node_name: impl Into<String>,
        device_manager: D,
        kubeconfig: Option<PathBuf>,
    ) -> Result<Self, Report<AdvertiseError>> {
        let client = kube_client::init_kube_client(kubeconfig).await?;
        Ok(Self::new(
            node_name,
            device_manager,
            KubeNodeClient::new(client),
        ))
    }
}

impl<C: NodeClient, D: DeviceManager> DeviceAdvertiser<C, D> {
    pub fn new(node_name: impl Into<String>, device_manager: D, client: C) -> Self {
        Self {
            node_name: node_name.into(),
            device_manager,
            client,
        }
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// Current device snapshot of this node.
    pub fn node_info(&self) -> NodeInfo {
        let mut node_info = NodeInfo::with_name(&self.node_name);
        self.device_manager.update_node_info(&mut node_info);
        node_info
    }

    /// Fetch the node, write the current device snapshot into a copy and patch
    /// the difference back.
    ///
    /// # Errors
    ///
    /// - [`AdvertiseError::NotFound`] if the node record does not exist
    /// - [`AdvertiseError::Annotation`] if the device snapshot cannot be encoded
    /// - [`AdvertiseError::Remote`] if fetching or patching fails; the node is
    ///   left as it was
    #[tracing::instrument(skip(self), fields(node = %self.node_name))]
    pub async fn patch_resources(&self) -> Result<PatchOutcome, Report<AdvertiseError>> {
        let node = self.client.get_node(&self.node_name).await?;

        let mut new_node = node.clone();
        let node_info = self.node_info();
        apply_node_info(&mut new_node, &node_info)?;

        trace!("Node before patch: {node:?}");
        trace!("Node after patch: {new_node:?}");

        let outcome = self
            .client
            .patch_node_metadata(&self.node_name, &node, &new_node)
            .await?;
        match outcome {
            PatchOutcome::Patched => debug!(
                resources = node_info.kube_cap.len(),
                "Advertised device resources"
            ),
            PatchOutcome::Unchanged => debug!("Device resources unchanged, nothing to patch"),
        }
        Ok(outcome)
    }

    /// Advertise every `interval` until cancelled, switching to `retry_interval`
    /// after a failed attempt and back once an attempt succeeds.
    ///
    /// Retries are unbounded and without backoff.
    pub async fn advertise_loop(
        &self,
        interval: Duration,
        retry_interval: Duration,
        cancellation_token: CancellationToken,
    ) {
        info!(
            node = %self.node_name,
            ?interval,
            ?retry_interval,
            "Starting device advertisement loop"
        );

        let mut state = AdvertiserState::new(interval, retry_interval, Instant::now());
        let mut ticker = periodic(state.period());

        loop {
            // scheduled deadline of the tick, not the wake-up time
            let attempt_at = select! {
                biased;
                _ = cancellation_token.cancelled() => {
                    info!("Device advertisement shutdown requested");
                    return;
                }
                deadline = ticker.tick() => deadline,
            };

            if !state.should_attempt(attempt_at) {
                continue;
            }

            let phase_changed = match self.patch_resources().await {
                Ok(_) => state.record_success(attempt_at),
                Err(e) => {
                    warn!(phase = ?state.phase(), "Failed to advertise device resources: {e:?}");
                    state.record_failure()
                }
            };

            if phase_changed {
                info!(
                    phase = ?state.phase(),
                    period = ?state.period(),
                    "Device advertisement phase changed"
                );
                ticker = periodic(state.period());
            }
        }
    }
}

/// Ticker whose first tick fires one `period` from now.
fn periodic(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Write `node_info` into the annotations and the native resource maps of `node`.
fn apply_node_info(node: &mut Node, node_info: &NodeInfo) -> Result<(), Report<AdvertiseError>> {
    annotations::node_info_to_annotation(&mut node.metadata, node_info)?;

    let status = node.status.get_or_insert_with(Default::default);
    let capacity = status.capacity.get_or_insert_with(Default::default);
    for (resource, quantity) in &node_info.kube_cap {
        capacity.insert(resource.clone(), decimal_quantity(*quantity));
    }
    let allocatable = status.allocatable.get_or_insert_with(Default::default);
    for (resource, quantity) in &node_info.kube_alloc {
        allocatable.insert(resource.clone(), decimal_quantity(*quantity));
    }
    Ok(())
}

/// Canonical decimal SI form of a non-negative count, as the API server stores it.
fn decimal_quantity(value: i64) -> Quantity {
    let mut mantissa = value.max(0);
    let mut exponent = 0;
    while mantissa != 0 && mantissa % 1000 == 0 && exponent < DECIMAL_SUFFIXES.len() - 1 {
        mantissa /= 1000;
        exponent += 1;
    }
    Quantity(format!("{mantissa}{}", DECIMAL_SUFFIXES[exponent]))
}
