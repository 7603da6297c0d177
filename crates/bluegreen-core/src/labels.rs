//! Version labelling scheme shared by every router.
//!
//! Green objects carry `k8s.deploy.color: green` and, when they are new
//! parallel copies, a `-green` name suffix. Stable copies use the `None`
//! marker. All helpers clone before mutating.

use crate::types::{ClusterObject, TemplateMeta};

/// Reserved label key holding the version marker.
pub const VERSION_LABEL: &str = "k8s.deploy.color";
pub const GREEN_LABEL_VALUE: &str = "green";
pub const NONE_LABEL_VALUE: &str = "None";

pub const GREEN_SUFFIX: &str = "-green";
pub const STABLE_SUFFIX: &str = "-stable";
pub const TRAFFIC_SPLIT_SUFFIX: &str = "-trafficsplit";

pub fn blue_green_name(name: &str, suffix: &str) -> String {
    format!("{name}{suffix}")
}

/// Current version marker of an object, if any.
pub fn version_label(object: &ClusterObject) -> Option<&str> {
    object
        .metadata()
        .labels
        .get(VERSION_LABEL)
        .map(String::as_str)
}

/// Stamp the version label on an object in place.
///
/// Sets metadata labels everywhere, the selector of a service, and the
/// selector plus pod template labels of a workload. Other kinds only get
/// the metadata label.
pub fn add_version_label(object: &mut ClusterObject, value: &str) {
    object
        .metadata_mut()
        .labels
        .insert(VERSION_LABEL.to_string(), value.to_string());

    match object {
        ClusterObject::Service(service) => {
            service
                .spec
                .selector
                .insert(VERSION_LABEL.to_string(), value.to_string());
        }
        ClusterObject::Workload(workload) => {
            if let Some(selector) = workload.spec.selector.as_mut() {
                selector
                    .match_labels
                    .insert(VERSION_LABEL.to_string(), value.to_string());
            }
            if let Some(template) = workload.spec.template.as_mut() {
                template
                    .metadata
                    .get_or_insert_with(TemplateMeta::default)
                    .labels
                    .insert(VERSION_LABEL.to_string(), value.to_string());
            }
        }
        ClusterObject::Ingress(_) | ClusterObject::TrafficSplit(_) | ClusterObject::Other(_) => {}
    }
}

/// Copy of `object` carrying the version label `value`. Name unchanged.
pub fn with_version_label(object: &ClusterObject, value: &str) -> ClusterObject {
    let mut copy = object.clone();
    add_version_label(&mut copy, value);
    copy
}

/// Copy of `object` prepared as a blue/green counterpart.
///
/// A green copy is renamed `<name>-green` so it can run next to the stable
/// object; any other label value keeps the original name.
pub fn new_blue_green_object(object: &ClusterObject, value: &str) -> ClusterObject {
    let mut copy = with_version_label(object, value);
    if value == GREEN_LABEL_VALUE {
        let metadata = copy.metadata_mut();
        metadata.name = blue_green_name(&metadata.name, GREEN_SUFFIX);
    }
    copy
}
