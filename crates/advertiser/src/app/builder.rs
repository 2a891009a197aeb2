use std::sync::Arc;

use anyhow::Result;
use error_stack::Report;

use crate::app::AdvertiserType;
use crate::app::Application;
use crate::config::DaemonArgs;
use crate::config::DeviceArgs;
use crate::domain::advertiser::DeviceAdvertiser;
use crate::domain::device::DeviceError;
use crate::domain::device::DevicesManager;
use crate::domain::device::NvidiaDevice;
use crate::domain::device::StaticDevice;
use crate::infrastructure::host;

/// Register the device providers enabled by `args`.
///
/// A missing NVIDIA driver only disables GPU discovery, while an invalid static
/// device file is fatal.
pub async fn build_device_manager(
    args: &DeviceArgs,
) -> Result<DevicesManager, Report<DeviceError>> {
    let mut manager = DevicesManager::new();

    if args.enable_nvidia {
        match NvidiaDevice::new() {
            Ok(device) => manager.add_device(device),
            Err(e) => tracing::warn!("NVIDIA GPU discovery disabled: {e:?}"),
        }
    }

    if let Some(path) = &args.static_devices_path {
        manager.add_device(StaticDevice::load(path).await?);
    }

    if manager.is_empty() {
        tracing::warn!("No devices registered, only an empty snapshot will be advertised");
    }
    Ok(manager)
}

/// Application builder
pub struct ApplicationBuilder {
    daemon_args: DaemonArgs,
}

impl ApplicationBuilder {
    pub fn new(daemon_args: DaemonArgs) -> Self {
        Self { daemon_args }
    }

    /// Build complete application
    pub async fn build(self) -> Result<Application> {
        tracing::info!("Building application components...");

        let address = host::resolve_node_address(
            self.daemon_args.hostname_override.as_deref(),
            self.daemon_args.node_ip.as_deref(),
        )
        .await
        .map_err(|e| anyhow::anyhow!("Failed to resolve node address: {e:?}"))?;
        tracing::info!(hostname = %address.hostname, ip = %address.ip, "Resolved node address");

        let device_manager = build_device_manager(&self.daemon_args.devices)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize devices: {e:?}"))?;

        let advertiser: Arc<AdvertiserType> = Arc::new(
            DeviceAdvertiser::connect(
                address.hostname.clone(),
                device_manager,
                self.daemon_args.kubeconfig.clone(),
            )
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create device advertiser: {e:?}"))?,
        );

        Ok(Application::new(advertiser, address, self.daemon_args))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use api_types::NodeInfo;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::domain::traits::DeviceManager;

    #[tokio::test]
    async fn static_devices_are_registered() {
        let mut temp_file = NamedTempFile::new().expect("should create temp file");
        temp_file
            .write_all(b"- name: example.com/fpga\n  capacity: 2\n  kube: true\n")
            .expect("should write to temp file");
        temp_file.flush().expect("should flush temp file");

        let args = DeviceArgs {
            enable_nvidia: false,
            static_devices_path: Some(temp_file.path().to_path_buf()),
        };
        let manager = build_device_manager(&args).await.unwrap();
        assert_eq!(manager.len(), 1);

        let mut info = NodeInfo::with_name("node-a");
        manager.update_node_info(&mut info);
        assert_eq!(info.kube_cap.get("example.com/fpga"), Some(&2));
    }

    #[tokio::test]
    async fn invalid_static_devices_are_fatal() {
        let args = DeviceArgs {
            enable_nvidia: false,
            static_devices_path: Some("/nonexistent/devices.yaml".into()),
        };
        assert!(build_device_manager(&args).await.is_err());
    }
}
