//! Cluster object model.
//!
//! Manifests are parsed into a closed set of object kinds. Only the fields
//! the rollout logic reads or rewrites are modelled; everything else lands
//! in `extra` maps and is written back untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

/// Label or selector mapping.
pub type Labels = BTreeMap<String, String>;

/// Unmodelled fields, carried through verbatim.
pub type Extra = BTreeMap<String, Value>;

/// Treat an explicit `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub labels: Labels,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ObjectMeta {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            labels: Labels::new(),
            extra: Extra::new(),
        }
    }
}

/// Coarse kind buckets used for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Workload,
    Service,
    Ingress,
    TrafficSplit,
    Other,
}

impl ObjectKind {
    const WORKLOAD_KINDS: [&'static str; 5] =
        ["deployment", "replicaset", "statefulset", "daemonset", "pod"];

    /// Map a manifest `kind` string (case-insensitive) to its bucket.
    pub fn of(kind: &str) -> Self {
        let kind = kind.to_ascii_lowercase();
        if Self::WORKLOAD_KINDS.contains(&kind.as_str()) {
            ObjectKind::Workload
        } else if kind == "service" {
            ObjectKind::Service
        } else if kind == "ingress" {
            ObjectKind::Ingress
        } else if kind == "trafficsplit" {
            ObjectKind::TrafficSplit
        } else {
            ObjectKind::Other
        }
    }
}

// ── Workloads ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workload {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: WorkloadSpec,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<LabelSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PodTemplate>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub match_labels: Labels,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TemplateMeta>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateMeta {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub labels: Labels,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Workload {
    pub fn is_pod(&self) -> bool {
        self.kind.eq_ignore_ascii_case("pod")
    }

    /// Labels carried by the pods this workload runs.
    ///
    /// A bare pod exposes its own metadata labels; controllers expose their
    /// pod template labels.
    pub fn pod_labels(&self) -> Option<&Labels> {
        if self.is_pod() {
            return Some(&self.metadata.labels).filter(|labels| !labels.is_empty());
        }
        self.spec
            .template
            .as_ref()
            .and_then(|template| template.metadata.as_ref())
            .map(|meta| &meta.labels)
            .filter(|labels| !labels.is_empty())
    }
}

// ── Services ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ServiceSpec,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub selector: Labels,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Service {
    /// True when every selector entry is present in `pod_labels`.
    pub fn selects(&self, pod_labels: &Labels) -> bool {
        !self.spec.selector.is_empty()
            && self
                .spec
                .selector
                .iter()
                .all(|(key, value)| pod_labels.get(key) == Some(value))
    }
}

// ── Ingresses ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingress {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: IngressSpec,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_backend: Option<IngressBackend>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub rules: Vec<IngressRule>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngressRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpIngressRuleValue>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpIngressRuleValue {
    #[serde(default, deserialize_with = "null_as_default")]
    pub paths: Vec<HttpIngressPath>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpIngressPath {
    pub backend: IngressBackend,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Backend reference. `networking.k8s.io/v1` uses `service.name`; older
/// API versions use `serviceName`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressBackend {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<IngressServiceBackend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngressServiceBackend {
    pub name: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl IngressBackend {
    pub fn service_name(&self) -> Option<&str> {
        self.service
            .as_ref()
            .map(|service| service.name.as_str())
            .or(self.service_name.as_deref())
    }

    /// Point the backend at another service, keeping whichever field
    /// style the manifest already uses.
    pub fn set_service_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if let Some(service) = self.service.as_mut() {
            service.name = name;
        } else if let Some(legacy) = self.service_name.as_mut() {
            *legacy = name;
        } else {
            self.service = Some(IngressServiceBackend {
                name,
                extra: Extra::new(),
            });
        }
    }
}

impl Ingress {
    /// All backends: the default backend first, then every rule path in order.
    pub fn backends(&self) -> impl Iterator<Item = &IngressBackend> + '_ {
        self.spec.default_backend.iter().chain(
            self.spec
                .rules
                .iter()
                .filter_map(|rule| rule.http.as_ref())
                .flat_map(|http| http.paths.iter().map(|path| &path.backend)),
        )
    }

    pub fn backends_mut(&mut self) -> Vec<&mut IngressBackend> {
        let IngressSpec {
            default_backend,
            rules,
            ..
        } = &mut self.spec;
        let mut backends: Vec<&mut IngressBackend> = default_backend.iter_mut().collect();
        for rule in rules.iter_mut() {
            if let Some(http) = rule.http.as_mut() {
                backends.extend(http.paths.iter_mut().map(|path| &mut path.backend));
            }
        }
        backends
    }
}

// ── Traffic splits ─────────────────────────────────────────────────

/// SMI `TrafficSplit`: distributes traffic for a root service across
/// weighted backend services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficSplit {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: TrafficSplitSpec,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficSplitSpec {
    pub service: String,
    #[serde(default)]
    pub backends: Vec<TrafficSplitBackend>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficSplitBackend {
    pub service: String,
    pub weight: SplitWeight,
    #[serde(flatten)]
    pub extra: Extra,
}

impl TrafficSplitBackend {
    pub fn new(service: impl Into<String>, weight: u32) -> Self {
        Self {
            service: service.into(),
            weight: SplitWeight::Units(weight),
            extra: Extra::new(),
        }
    }
}

/// Backend weight. `v1alpha1` splits use quantity strings such as `500m`;
/// later versions use plain integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SplitWeight {
    Units(u32),
    Quantity(String),
}

impl SplitWeight {
    /// Integer weight, when the manifest gave one.
    pub fn units(&self) -> Option<u32> {
        match self {
            SplitWeight::Units(units) => Some(*units),
            SplitWeight::Quantity(_) => None,
        }
    }
}

impl From<u32> for SplitWeight {
    fn from(units: u32) -> Self {
        SplitWeight::Units(units)
    }
}

// ── Everything else ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericObject {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A parsed manifest document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClusterObject {
    Workload(Workload),
    Service(Service),
    Ingress(Ingress),
    TrafficSplit(TrafficSplit),
    Other(GenericObject),
}

impl ClusterObject {
    /// Decode one manifest document, dispatching on its `kind`.
    pub fn from_value(value: Value) -> Result<Self, serde_yaml::Error> {
        use serde::de::Error as _;

        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .map(ObjectKind::of)
            .ok_or_else(|| serde_yaml::Error::custom("document has no string `kind` field"))?;

        Ok(match kind {
            ObjectKind::Workload => ClusterObject::Workload(serde_yaml::from_value(value)?),
            ObjectKind::Service => ClusterObject::Service(serde_yaml::from_value(value)?),
            ObjectKind::Ingress => ClusterObject::Ingress(serde_yaml::from_value(value)?),
            ObjectKind::TrafficSplit => {
                ClusterObject::TrafficSplit(serde_yaml::from_value(value)?)
            }
            ObjectKind::Other => ClusterObject::Other(serde_yaml::from_value(value)?),
        })
    }

    pub fn object_kind(&self) -> ObjectKind {
        match self {
            ClusterObject::Workload(_) => ObjectKind::Workload,
            ClusterObject::Service(_) => ObjectKind::Service,
            ClusterObject::Ingress(_) => ObjectKind::Ingress,
            ClusterObject::TrafficSplit(_) => ObjectKind::TrafficSplit,
            ClusterObject::Other(_) => ObjectKind::Other,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            ClusterObject::Workload(o) => &o.kind,
            ClusterObject::Service(o) => &o.kind,
            ClusterObject::Ingress(o) => &o.kind,
            ClusterObject::TrafficSplit(o) => &o.kind,
            ClusterObject::Other(o) => &o.kind,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            ClusterObject::Workload(o) => &o.metadata,
            ClusterObject::Service(o) => &o.metadata,
            ClusterObject::Ingress(o) => &o.metadata,
            ClusterObject::TrafficSplit(o) => &o.metadata,
            ClusterObject::Other(o) => &o.metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
        match self {
            ClusterObject::Workload(o) => &mut o.metadata,
            ClusterObject::Service(o) => &mut o.metadata,
            ClusterObject::Ingress(o) => &mut o.metadata,
            ClusterObject::TrafficSplit(o) => &mut o.metadata,
            ClusterObject::Other(o) => &mut o.metadata,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata().name
    }

    pub fn as_service(&self) -> Option<&Service> {
        match self {
            ClusterObject::Service(service) => Some(service),
            _ => None,
        }
    }

    pub fn as_ingress(&self) -> Option<&Ingress> {
        match self {
            ClusterObject::Ingress(ingress) => Some(ingress),
            _ => None,
        }
    }

    pub fn as_traffic_split(&self) -> Option<&TrafficSplit> {
        match self {
            ClusterObject::TrafficSplit(split) => Some(split),
            _ => None,
        }
    }
}

impl From<Workload> for ClusterObject {
    fn from(value: Workload) -> Self {
        ClusterObject::Workload(value)
    }
}

impl From<Service> for ClusterObject {
    fn from(value: Service) -> Self {
        ClusterObject::Service(value)
    }
}

impl From<Ingress> for ClusterObject {
    fn from(value: Ingress) -> Self {
        ClusterObject::Ingress(value)
    }
}

impl From<TrafficSplit> for ClusterObject {
    fn from(value: TrafficSplit) -> Self {
        ClusterObject::TrafficSplit(value)
    }
}

impl From<GenericObject> for ClusterObject {
    fn from(value: GenericObject) -> Self {
        ClusterObject::Other(value)
    }
}
