//! Application module
//!
//! Lifecycle of the advertiser daemon: building its components, running the
//! advertisement task and shutting it down on signals.

pub mod builder;
pub mod core;
pub mod tasks;

pub use builder::build_device_manager;
pub use builder::ApplicationBuilder;
pub use self::core::Application;
pub use tasks::start_device_advertiser;
pub use tasks::Tasks;

use crate::domain::advertiser::DeviceAdvertiser;
use crate::domain::device::DevicesManager;
use crate::infrastructure::k8s::KubeNodeClient;

pub type AdvertiserType = DeviceAdvertiser<KubeNodeClient, DevicesManager>;
