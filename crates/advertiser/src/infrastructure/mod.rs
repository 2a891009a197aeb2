pub mod host;
pub mod k8s;
pub mod kube_client;
