use std::path::Path;

use api_types::NodeInfo;
use error_stack::Report;
use error_stack::ResultExt;
use serde::Deserialize;
use serde::Serialize;

use super::Device;
use super::DeviceError;

const DEVICE_NAME: &str = "static";

/// A resource declared in the static device file, e.g.
///
/// ```yaml
/// - name: example.com/fpga
///   capacity: 2
///   allocatable: 1
///   kube: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticResource {
    pub name: String,
    pub capacity: i64,
    /// Defaults to `capacity`
    #[serde(default)]
    pub allocatable: Option<i64>,
    /// Also advertise as a native extended resource
    #[serde(default)]
    pub kube: bool,
}

impl StaticResource {
    fn allocatable(&self) -> i64 {
        self.allocatable.unwrap_or(self.capacity)
    }
}

/// Devices that cannot be discovered and are declared by the operator instead.
#[derive(Debug, Clone)]
pub struct StaticDevice {
    resources: Vec<StaticResource>,
}

impl StaticDevice {
    /// Load the resource declarations from a YAML file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Report<DeviceError>> {
        let path = path.as_ref();
        tracing::info!("Loading static devices from {:?}", path);

        let content = tokio::fs::read_to_string(path).await.change_context(
            DeviceError::InvalidConfig {
                message: format!("Failed to read static device file {}", path.display()),
            },
        )?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, Report<DeviceError>> {
        let resources: Vec<StaticResource> =
            serde_yaml::from_str(content).change_context(DeviceError::InvalidConfig {
                message: "Failed to parse static device YAML".to_string(),
            })?;
        Self::new(resources)
    }

    /// # Errors
    ///
    /// - [`DeviceError::InvalidConfig`] for empty names, negative quantities or
    ///   allocatable exceeding capacity
    pub fn new(resources: Vec<StaticResource>) -> Result<Self, Report<DeviceError>> {
        for resource in &resources {
            let invalid = |message: String| Report::new(DeviceError::InvalidConfig { message });

            if resource.name.trim().is_empty() {
                return Err(invalid("static resource without a name".to_string()));
            }
            if resource.capacity < 0 || resource.allocatable() < 0 {
                return Err(invalid(format!(
                    "negative quantity for static resource {}",
                    resource.name
                )));
            }
            if resource.allocatable() > resource.capacity {
                return Err(invalid(format!(
                    "allocatable exceeds capacity for static resource {}",
                    resource.name
                )));
            }
        }
        Ok(Self { resources })
    }
}

impl Device for StaticDevice {
    fn name(&self) -> &str {
        DEVICE_NAME
    }

    fn update_node_info(&self, node_info: &mut NodeInfo) -> Result<(), Report<DeviceError>> {
        for resource in &self.resources {
            node_info
                .capacity
                .insert(resource.name.clone(), resource.capacity);
            node_info
                .allocatable
                .insert(resource.name.clone(), resource.allocatable());
            if resource.kube {
                node_info
                    .kube_cap
                    .insert(resource.name.clone(), resource.capacity);
                node_info
                    .kube_alloc
                    .insert(resource.name.clone(), resource.allocatable());
            }
        }
        Ok(())
    }
}
