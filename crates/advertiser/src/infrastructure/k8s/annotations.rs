use api_types::NodeInfo;
use error_stack::Report;
use error_stack::ResultExt;
use kube::api::ObjectMeta;

use crate::infrastructure::k8s::AdvertiseError;

/// Annotation carrying the JSON encoded device snapshot of a node.
pub const NODE_INFO_ANNOTATION: &str = "node.alpha/DeviceInformation";

/// Write `node_info` into the annotations of `meta`, keeping unrelated annotations.
///
/// # Errors
///
/// - [`AdvertiseError::Annotation`] if the snapshot cannot be encoded
pub fn node_info_to_annotation(
    meta: &mut ObjectMeta,
    node_info: &NodeInfo,
) -> Result<(), Report<AdvertiseError>> {
    let encoded = serde_json::to_string(node_info).change_context(AdvertiseError::Annotation {
        message: format!("Failed to encode device information of {}", node_info.name),
    })?;

    meta.annotations
        .get_or_insert_with(Default::default)
        .insert(NODE_INFO_ANNOTATION.to_string(), encoded);
    Ok(())
}

/// Read the device snapshot back from `meta`, `None` when it was never advertised.
///
/// # Errors
///
/// - [`AdvertiseError::Annotation`] if the annotation is not a valid snapshot
pub fn annotation_to_node_info(
    meta: &ObjectMeta,
) -> Result<Option<NodeInfo>, Report<AdvertiseError>> {
    let Some(value) = meta
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(NODE_INFO_ANNOTATION))
    else {
        return Ok(None);
    };

    serde_json::from_str(value)
        .map(Some)
        .change_context(AdvertiseError::Annotation {
            message: format!("Invalid {NODE_INFO_ANNOTATION} annotation: {value}"),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use similar_asserts::assert_eq;

    use super::*;

    fn sample_node_info() -> NodeInfo {
        let mut info = NodeInfo::with_name("node-a");
        info.set_device_resource("alpha/grpresource/gpu/gpu-0/cards", 1);
        info.set_kube_resource("nvidia.com/gpu", 1);
        info
    }

    #[test]
    fn encode_keeps_unrelated_annotations() {
        let mut meta = ObjectMeta {
            annotations: Some(BTreeMap::from([(
                "node.alpha.kubernetes.io/ttl".to_string(),
                "0".to_string(),
            )])),
            ..Default::default()
        };

        node_info_to_annotation(&mut meta, &sample_node_info()).unwrap();

        let annotations = meta.annotations.as_ref().unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations["node.alpha.kubernetes.io/ttl"], "0");
        assert!(annotations.contains_key(NODE_INFO_ANNOTATION));
    }

    #[test]
    fn encode_creates_annotation_map() {
        let mut meta = ObjectMeta::default();
        node_info_to_annotation(&mut meta, &sample_node_info()).unwrap();

        let decoded = annotation_to_node_info(&meta).unwrap();
        assert_eq!(decoded, Some(sample_node_info()));
    }

    #[test]
    fn encoding_is_deterministic() {
        let mut first = ObjectMeta::default();
        let mut second = ObjectMeta::default();
        node_info_to_annotation(&mut first, &sample_node_info()).unwrap();
        node_info_to_annotation(&mut second, &sample_node_info()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn absent_annotation_decodes_to_none() {
        assert_eq!(annotation_to_node_info(&ObjectMeta::default()).unwrap(), None);
    }

    #[test]
    fn malformed_annotation_is_rejected() {
        let meta = ObjectMeta {
            annotations: Some(BTreeMap::from([(
                NODE_INFO_ANNOTATION.to_string(),
                "{not json".to_string(),
            )])),
            ..Default::default()
        };

        let error = annotation_to_node_info(&meta).expect_err("should reject malformed json");
        assert!(matches!(
            error.current_context(),
            AdvertiseError::Annotation { .. }
        ));
        assert!(error.to_string().contains("Invalid node.alpha/DeviceInformation"));
    }
}
