//! Seams the advertiser is built against, so that it can be driven by fakes in tests

use std::future::Future;

use api_types::NodeInfo;
use error_stack::Report;
use k8s_openapi::api::core::v1::Node;

use crate::infrastructure::k8s::AdvertiseError;
use crate::infrastructure::k8s::PatchOutcome;

/// Access to the node records of the cluster control plane
pub trait NodeClient: Send + Sync {
    /// Fetch the current node record
    fn get_node(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Node, Report<AdvertiseError>>> + Send;

    /// Patch the node with the difference between `original` and `modified`
    fn patch_node_metadata(
        &self,
        name: &str,
        original: &Node,
        modified: &Node,
    ) -> impl Future<Output = Result<PatchOutcome, Report<AdvertiseError>>> + Send;
}

/// Source of the device resources present on this node
pub trait DeviceManager: Send + Sync {
    /// Fill `node_info` with the current device resources
    fn update_node_info(&self, node_info: &mut NodeInfo);
}
