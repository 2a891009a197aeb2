use std::ffi::OsStr;

use api_types::NodeInfo;
use error_stack::Report;
use error_stack::ResultExt;
use nvml_wrapper::Nvml;

use super::Device;
use super::DeviceError;

const DEVICE_NAME: &str = "nvidia";

/// Native extended resource consumed by the default scheduler.
pub const NVIDIA_GPU_RESOURCE: &str = "nvidia.com/gpu";

/// Prefix of the per-card resources carried in the device annotation.
const GPU_RESOURCE_PREFIX: &str = "alpha/grpresource/gpu";

/// NVIDIA GPUs enumerated through NVML.
pub struct NvidiaDevice {
    nvml: Nvml,
}

impl NvidiaDevice {
    pub fn new() -> Result<Self, Report<DeviceError>> {
        Ok(Self { nvml: init_nvml()? })
    }

    fn query_failed(message: impl Into<String>) -> DeviceError {
        DeviceError::QueryFailed {
            device: DEVICE_NAME.to_string(),
            message: message.into(),
        }
    }
}

fn init_nvml() -> Result<Nvml, Report<DeviceError>> {
    match Nvml::init() {
        Ok(nvml) => {
            tracing::info!("NVML initialized successfully");
            Ok(nvml)
        }
        Err(_) => {
            tracing::warn!("Standard NVML init failed, trying with explicit library path");
            let nvml = Nvml::builder()
                .lib_path(OsStr::new("libnvidia-ml.so.1"))
                .init()
                .change_context(DeviceError::InitFailed {
                    device: DEVICE_NAME.to_string(),
                    message: "NVML is not available".to_string(),
                })?;
            tracing::info!("NVML initialized with explicit library path");
            Ok(nvml)
        }
    }
}

impl Device for NvidiaDevice {
    fn name(&self) -> &str {
        DEVICE_NAME
    }

    fn update_node_info(&self, node_info: &mut NodeInfo) -> Result<(), Report<DeviceError>> {
        let device_count = self
            .nvml
            .device_count()
            .change_context(Self::query_failed("device count"))?;

        let mut cards = Vec::with_capacity(device_count as usize);
        for index in 0..device_count {
            let device = self
                .nvml
                .device_by_index(index)
                .change_context(Self::query_failed(format!("device {index}")))?;
            let uuid = device
                .uuid()
                .change_context(Self::query_failed(format!("uuid of device {index}")))?
                .to_lowercase();
            let memory = device
                .memory_info()
                .change_context(Self::query_failed(format!("memory of device {uuid}")))?
                .total;
            cards.push((uuid, i64::try_from(memory).unwrap_or(i64::MAX)));
        }

        for (uuid, memory) in cards {
            node_info.set_device_resource(format!("{GPU_RESOURCE_PREFIX}/{uuid}/cards"), 1);
            node_info.set_device_resource(format!("{GPU_RESOURCE_PREFIX}/{uuid}/memory"), memory);
        }
        node_info.set_kube_resource(NVIDIA_GPU_RESOURCE, i64::from(device_count));

        tracing::debug!(device_count, "Collected NVIDIA GPU resources");
        Ok(())
    }
}
