//! Shared API type definitions
//!
//! This crate contains the device snapshot exchanged between device providers,
//! the advertiser and the node annotation consumed by schedulers.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// Resource name to quantity, ordered so that encodings are deterministic.
pub type ResourceList = BTreeMap<String, i64>;

/// Snapshot of the device resources present on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct NodeInfo {
    /// Node name
    pub name: String,
    /// Device-internal capacity, only carried in the node annotation
    #[serde(default)]
    pub capacity: ResourceList,
    /// Device-internal allocatable resources
    #[serde(default)]
    pub allocatable: ResourceList,
    /// Device-internal resources already in use
    #[serde(default)]
    pub used: ResourceList,
    /// Native extended resources written into `status.capacity`
    #[serde(default)]
    pub kube_cap: ResourceList,
    /// Native extended resources written into `status.allocatable`
    #[serde(default)]
    pub kube_alloc: ResourceList,
}

impl NodeInfo {
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set a device-internal resource as both capacity and allocatable.
    pub fn set_device_resource(&mut self, resource: impl Into<String>, quantity: i64) {
        let resource = resource.into();
        self.capacity.insert(resource.clone(), quantity);
        self.allocatable.insert(resource, quantity);
    }

    /// Set a native extended resource as both capacity and allocatable.
    pub fn set_kube_resource(&mut self, resource: impl Into<String>, quantity: i64) {
        let resource = resource.into();
        self.kube_cap.insert(resource.clone(), quantity);
        self.kube_alloc.insert(resource, quantity);
    }
}
