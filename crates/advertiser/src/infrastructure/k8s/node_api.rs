use error_stack::Report;
use error_stack::ResultExt;
use k8s_openapi::api::core::v1::Node;
use kube::api::Patch;
use kube::api::PatchParams;
use kube::Api;
use kube::Client;

use crate::domain::traits::NodeClient;
use crate::infrastructure::k8s::AdvertiseError;
use crate::infrastructure::k8s::PatchOutcome;

/// Compute the JSON patch turning `original` into `modified`.
///
/// # Errors
///
/// - [`AdvertiseError::Remote`] if either record cannot be serialized
pub fn node_patch(
    original: &Node,
    modified: &Node,
) -> Result<json_patch::Patch, Report<AdvertiseError>> {
    let before = serde_json::to_value(original).change_context(AdvertiseError::Remote {
        message: "Failed to serialize original node".to_string(),
    })?;
    let after = serde_json::to_value(modified).change_context(AdvertiseError::Remote {
        message: "Failed to serialize modified node".to_string(),
    })?;
    Ok(json_patch::diff(&before, &after))
}

/// [`NodeClient`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeNodeClient {
    nodes: Api<Node>,
}

impl KubeNodeClient {
    pub fn new(client: Client) -> Self {
        Self {
            nodes: Api::all(client),
        }
    }
}

impl NodeClient for KubeNodeClient {
    async fn get_node(&self, name: &str) -> Result<Node, Report<AdvertiseError>> {
        match self.nodes.get(name).await {
            Ok(node) => Ok(node),
            Err(kube::Error::Api(response)) if response.code == 404 => {
                Err(Report::new(kube::Error::Api(response)).change_context(
                    AdvertiseError::NotFound {
                        node_name: name.to_string(),
                    },
                ))
            }
            Err(e) => Err(Report::new(e).change_context(AdvertiseError::Remote {
                message: format!("Failed to get node {name}"),
            })),
        }
    }

    async fn patch_node_metadata(
        &self,
        name: &str,
        original: &Node,
        modified: &Node,
    ) -> Result<PatchOutcome, Report<AdvertiseError>> {
        let patch = node_patch(original, modified)?;
        if patch.0.is_empty() {
            return Ok(PatchOutcome::Unchanged);
        }

        tracing::debug!(node = name, operations = patch.0.len(), "Patching node status");
        self.nodes
            .patch_status(name, &PatchParams::default(), &Patch::Json::<()>(patch))
            .await
            .change_context(AdvertiseError::Remote {
                message: format!("Failed to patch node {name}"),
            })?;

        Ok(PatchOutcome::Patched)
    }
}
