//! In-memory implementations of the advertiser seams for tests

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use api_types::NodeInfo;
use error_stack::Report;
use k8s_openapi::api::core::v1::Node;
use k8s_openapi::api::core::v1::NodeStatus;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::ObjectMeta;
use tokio::time::Instant;

use super::traits::DeviceManager;
use super::traits::NodeClient;
use crate::infrastructure::k8s::node_api::node_patch;
use crate::infrastructure::k8s::AdvertiseError;
use crate::infrastructure::k8s::PatchOutcome;

/// A node as the API server would hold it, with some CPU and memory already reported.
pub fn remote_node(name: &str) -> Node {
    let resources = BTreeMap::from([
        ("cpu".to_string(), Quantity("8".to_string())),
        ("memory".to_string(), Quantity("32Gi".to_string())),
    ]);
    Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        status: Some(NodeStatus {
            capacity: Some(resources.clone()),
            allocatable: Some(resources),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[derive(Default)]
struct ClientState {
    failures_remaining: usize,
    next_delay: Option<Duration>,
    fail_patch: bool,
    attempts: Vec<Duration>,
    patches_applied: usize,
}

/// Node client holding a single node in memory and applying patches to it
#[derive(Clone)]
pub struct FakeNodeClient {
    node: Arc<Mutex<Node>>,
    state: Arc<Mutex<ClientState>>,
    created_at: Instant,
}

impl FakeNodeClient {
    pub fn new(node: Node) -> Self {
        Self {
            node: Arc::new(Mutex::new(node)),
            state: Default::default(),
            created_at: Instant::now(),
        }
    }

    /// Fail the next `count` fetches with a remote error
    pub fn fail_next(&self, count: usize) {
        self.state.lock().unwrap().failures_remaining = count;
    }

    /// Make the next fetch take `delay` before answering
    pub fn delay_next(&self, delay: Duration) {
        self.state.lock().unwrap().next_delay = Some(delay);
    }

    /// Fail every patch submission after a successful fetch
    pub fn set_patch_failure(&self, enabled: bool) {
        self.state.lock().unwrap().fail_patch = enabled;
    }

    /// Offsets from client creation at which a fetch was attempted
    pub fn attempt_offsets(&self) -> Vec<Duration> {
        self.state.lock().unwrap().attempts.clone()
    }

    pub fn patches_applied(&self) -> usize {
        self.state.lock().unwrap().patches_applied
    }

    pub fn node(&self) -> Node {
        self.node.lock().unwrap().clone()
    }
}

impl NodeClient for FakeNodeClient {
    async fn get_node(&self, name: &str) -> Result<Node, Report<AdvertiseError>> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.attempts.push(self.created_at.elapsed());
            if state.failures_remaining > 0 {
                state.failures_remaining -= 1;
                return Err(Report::new(AdvertiseError::Remote {
                    message: "connection refused".to_string(),
                }));
            }
            state.next_delay.take()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let node = self.node.lock().unwrap().clone();
        if node.metadata.name.as_deref() != Some(name) {
            return Err(Report::new(AdvertiseError::NotFound {
                node_name: name.to_string(),
            }));
        }
        Ok(node)
    }

    async fn patch_node_metadata(
        &self,
        _name: &str,
        original: &Node,
        modified: &Node,
    ) -> Result<PatchOutcome, Report<AdvertiseError>> {
        if self.state.lock().unwrap().fail_patch {
            return Err(Report::new(AdvertiseError::Remote {
                message: "forbidden".to_string(),
            }));
        }

        let patch = node_patch(original, modified)?;
        if patch.0.is_empty() {
            return Ok(PatchOutcome::Unchanged);
        }

        let mut node = self.node.lock().unwrap();
        let mut value = serde_json::to_value(&*node).unwrap();
        json_patch::patch(&mut value, &patch.0).unwrap();
        *node = serde_json::from_value(value).unwrap();
        self.state.lock().unwrap().patches_applied += 1;
        Ok(PatchOutcome::Patched)
    }
}

/// Device manager reporting a configurable set of native extended resources
#[derive(Clone, Default)]
pub struct FakeDeviceManager {
    resources: Arc<Mutex<BTreeMap<String, i64>>>,
}

impl FakeDeviceManager {
    pub fn with_resource(resource: &str, quantity: i64) -> Self {
        let manager = Self::default();
        manager.set_resource(resource, quantity);
        manager
    }

    pub fn set_resource(&self, resource: &str, quantity: i64) {
        self.resources
            .lock()
            .unwrap()
            .insert(resource.to_string(), quantity);
    }
}

impl DeviceManager for FakeDeviceManager {
    fn update_node_info(&self, node_info: &mut NodeInfo) {
        for (resource, quantity) in self.resources.lock().unwrap().iter() {
            node_info.set_kube_resource(resource.clone(), *quantity);
            node_info.set_device_resource(format!("alpha/grpresource/{resource}"), *quantity);
        }
    }
}
