//! Kubernetes integration module.
//!
//! - [`KubeNodeClient`]: reads and patches the `Node` object of this machine
//! - [`annotations`]: encoding of the device snapshot into node annotations
//! - [`AdvertiseError`]: errors of the advertisement path

pub mod annotations;
pub mod node_api;
pub mod types;

pub use node_api::KubeNodeClient;
pub use types::AdvertiseError;
pub use types::PatchOutcome;
