pub mod app;
pub mod config;
mod domain;
mod infrastructure;

// Re-export main modules
pub use domain::advertiser;
pub use domain::device;
pub use domain::state;
pub use domain::traits;
pub use infrastructure::host;
pub use infrastructure::k8s;
pub use infrastructure::kube_client;
