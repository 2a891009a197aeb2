use std::path::PathBuf;

use error_stack::Report;
use error_stack::ResultExt;
use kube::config::KubeConfigOptions;
use kube::config::Kubeconfig;
use kube::Client;
use kube::Config;

use crate::infrastructure::k8s::AdvertiseError;

/// Build an authenticated client, from `kubeconfig` when given and from the
/// in-cluster environment or `~/.kube/config` otherwise.
pub async fn init_kube_client(
    kubeconfig: Option<PathBuf>,
) -> Result<Client, Report<AdvertiseError>> {
    let config = match kubeconfig {
        Some(kubeconfig_path) => {
            let kubeconfig = Kubeconfig::read_from(&kubeconfig_path).change_context(
                AdvertiseError::Configuration {
                    message: format!(
                        "Failed to read kubeconfig file: {}",
                        kubeconfig_path.display()
                    ),
                },
            )?;

            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .change_context(AdvertiseError::Configuration {
                    message: format!(
                        "Failed to create config from kubeconfig: {}",
                        kubeconfig_path.display()
                    ),
                })?
        }
        None => Config::infer()
            .await
            .change_context(AdvertiseError::Configuration {
                message: "Failed to infer Kubernetes client config".to_string(),
            })?,
    };

    tracing::debug!(cluster_url = %config.cluster_url, "Kubernetes client config loaded");

    Client::try_from(config).change_context(AdvertiseError::Configuration {
        message: "Failed to create Kubernetes client".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_kubeconfig_is_a_configuration_error() {
        let result = init_kube_client(Some(PathBuf::from("/nonexistent/kubeconfig"))).await;

        let Err(error) = result else {
            panic!("should fail for a missing kubeconfig");
        };
        assert!(matches!(
            error.current_context(),
            AdvertiseError::Configuration { .. }
        ));
        assert!(error
            .to_string()
            .contains("Failed to read kubeconfig file"));
    }
}
