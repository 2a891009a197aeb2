use core::error::Error;

/// Errors that can occur while advertising node resources.
#[derive(Debug, derive_more::Display)]
pub enum AdvertiseError {
    #[display("Invalid configuration: {message}")]
    Configuration { message: String },
    #[display("Failed to resolve node address: {message}")]
    Resolution { message: String },
    #[display("Kubernetes API request failed: {message}")]
    Remote { message: String },
    #[display("Invalid device annotation: {message}")]
    Annotation { message: String },
    #[display("Node not found: {node_name}")]
    NotFound { node_name: String },
}

impl Error for AdvertiseError {}

/// Result of submitting a node patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The diff was non-empty and was accepted by the API server.
    Patched,
    /// Original and modified records were identical, nothing was sent.
    Unchanged,
}
