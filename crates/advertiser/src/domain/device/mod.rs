//! Device providers and the manager aggregating them into a node snapshot.

use core::error::Error;

use api_types::NodeInfo;
use error_stack::Report;

use crate::domain::traits::DeviceManager;

pub mod nvidia;
pub mod static_device;

pub use nvidia::NvidiaDevice;
pub use static_device::StaticDevice;

#[derive(Debug, derive_more::Display)]
pub enum DeviceError {
    #[display("Failed to initialize device {device}: {message}")]
    InitFailed { device: String, message: String },
    #[display("Failed to query device {device}: {message}")]
    QueryFailed { device: String, message: String },
    #[display("Invalid device configuration: {message}")]
    InvalidConfig { message: String },
}

impl Error for DeviceError {}

/// A kind of hardware device able to report its resources.
pub trait Device: Send + Sync {
    fn name(&self) -> &str;

    /// Add this device's resources to `node_info`.
    ///
    /// Implementations leave `node_info` untouched when they fail.
    fn update_node_info(&self, node_info: &mut NodeInfo) -> Result<(), Report<DeviceError>>;
}

/// Aggregates all devices registered on this node.
#[derive(Default)]
pub struct DevicesManager {
    devices: Vec<Box<dyn Device>>,
}

impl DevicesManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_device(&mut self, device: impl Device + 'static) {
        tracing::info!(device = device.name(), "Registered device");
        self.devices.push(Box::new(device));
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl DeviceManager for DevicesManager {
    fn update_node_info(&self, node_info: &mut NodeInfo) {
        for device in &self.devices {
            if let Err(e) = device.update_node_info(node_info) {
                tracing::warn!(device = device.name(), "Skipping device in node info: {e:?}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    struct FixedDevice(&'static str, i64);

    impl Device for FixedDevice {
        fn name(&self) -> &str {
            self.0
        }

        fn update_node_info(&self, node_info: &mut NodeInfo) -> Result<(), Report<DeviceError>> {
            node_info.set_kube_resource(self.0, self.1);
            Ok(())
        }
    }

    struct BrokenDevice;

    impl Device for BrokenDevice {
        fn name(&self) -> &str {
            "broken"
        }

        fn update_node_info(&self, _node_info: &mut NodeInfo) -> Result<(), Report<DeviceError>> {
            Err(Report::new(DeviceError::QueryFailed {
                device: "broken".to_string(),
                message: "driver gone".to_string(),
            }))
        }
    }

    #[test_log::test]
    fn failing_device_does_not_hide_others() {
        let mut manager = DevicesManager::new();
        manager.add_device(FixedDevice("example.com/fpga", 2));
        manager.add_device(BrokenDevice);
        manager.add_device(FixedDevice("example.com/tpu", 8));
        assert_eq!(manager.len(), 3);

        let mut info = NodeInfo::with_name("node-a");
        manager.update_node_info(&mut info);

        let mut expected = NodeInfo::with_name("node-a");
        expected.set_kube_resource("example.com/fpga", 2);
        expected.set_kube_resource("example.com/tpu", 8);
        assert_eq!(info, expected);
    }

    #[test]
    fn empty_manager_reports_nothing() {
        let manager = DevicesManager::new();
        assert!(manager.is_empty());

        let mut info = NodeInfo::with_name("node-a");
        manager.update_node_info(&mut info);
        assert_eq!(info, NodeInfo::with_name("node-a"));
    }
}
