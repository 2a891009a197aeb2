use std::path::PathBuf;

use clap::Args;
use clap::Parser;

/// Flags selecting the device providers registered on this node
#[derive(Args, Clone, Debug)]
pub struct DeviceArgs {
    #[arg(
        long,
        help = "Discover NVIDIA GPUs through NVML",
        default_value_t = true,
        env = "ENABLE_NVIDIA",
        action = clap::ArgAction::Set
    )]
    pub enable_nvidia: bool,

    #[arg(
        long,
        env = "STATIC_DEVICES_PATH",
        value_hint = clap::ValueHint::FilePath,
        help = "YAML file declaring static device resources, e.g. /etc/device-advertiser/devices.yaml"
    )]
    pub static_devices_path: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
pub struct ShowDevicesArgs {
    #[command(flatten)]
    pub devices: DeviceArgs,

    #[arg(
        long,
        env = "NODE_NAME",
        help = "Node name to report, defaults to the OS hostname"
    )]
    pub hostname_override: Option<String>,
}
