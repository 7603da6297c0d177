//! Manifest classification.
//!
//! Splits a flat object list into the buckets the rollout strategies work
//! with. A service is routable when its selector matches the pods of some
//! workload in the same set; any other service is left unrouted and is
//! never rewritten by a router.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::error::ManifestResult;
use crate::manifest::read_manifests;
use crate::types::{ClusterObject, Ingress, Service, Workload};

/// Objects of one manifest set, bucketed by their role in a rollout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedManifests {
    workloads: Vec<Workload>,
    routable_services: Vec<Service>,
    ingresses: Vec<Ingress>,
    unrouted_services: Vec<Service>,
    other_objects: Vec<ClusterObject>,
    service_by_name: BTreeMap<String, Service>,
}

impl ClassifiedManifests {
    pub fn workloads(&self) -> &[Workload] {
        &self.workloads
    }

    pub fn routable_services(&self) -> &[Service] {
        &self.routable_services
    }

    pub fn ingresses(&self) -> &[Ingress] {
        &self.ingresses
    }

    pub fn unrouted_services(&self) -> &[Service] {
        &self.unrouted_services
    }

    pub fn other_objects(&self) -> &[ClusterObject] {
        &self.other_objects
    }

    /// Routable services keyed by name.
    pub fn service_by_name(&self) -> &BTreeMap<String, Service> {
        &self.service_by_name
    }

    pub fn workload_objects(&self) -> Vec<ClusterObject> {
        to_objects(&self.workloads)
    }

    pub fn routable_service_objects(&self) -> Vec<ClusterObject> {
        to_objects(&self.routable_services)
    }

    pub fn ingress_objects(&self) -> Vec<ClusterObject> {
        to_objects(&self.ingresses)
    }

    pub fn unrouted_service_objects(&self) -> Vec<ClusterObject> {
        to_objects(&self.unrouted_services)
    }

    pub fn is_empty(&self) -> bool {
        self.workloads.is_empty()
            && self.routable_services.is_empty()
            && self.ingresses.is_empty()
            && self.unrouted_services.is_empty()
            && self.other_objects.is_empty()
    }
}

fn to_objects<T: Clone + Into<ClusterObject>>(items: &[T]) -> Vec<ClusterObject> {
    items.iter().cloned().map(Into::into).collect()
}

/// Bucket already-parsed objects. Order within each bucket follows input order.
pub fn classify(objects: Vec<ClusterObject>) -> ClassifiedManifests {
    let mut classified = ClassifiedManifests::default();
    let mut services = Vec::new();

    for object in objects {
        match object {
            ClusterObject::Workload(workload) => classified.workloads.push(workload),
            ClusterObject::Service(service) => services.push(service),
            ClusterObject::Ingress(ingress) => classified.ingresses.push(ingress),
            other @ (ClusterObject::TrafficSplit(_) | ClusterObject::Other(_)) => {
                classified.other_objects.push(other)
            }
        }
    }

    // Services are resolved after all workloads are known so the result
    // does not depend on document order.
    for service in services {
        let routed = classified
            .workloads
            .iter()
            .filter_map(Workload::pod_labels)
            .any(|labels| service.selects(labels));
        if routed {
            classified
                .service_by_name
                .insert(service.metadata.name.clone(), service.clone());
            classified.routable_services.push(service);
        } else {
            debug!(service = %service.metadata.name, "service does not select any workload, left unrouted");
            classified.unrouted_services.push(service);
        }
    }

    debug!(
        workloads = classified.workloads.len(),
        routable = classified.routable_services.len(),
        ingresses = classified.ingresses.len(),
        unrouted = classified.unrouted_services.len(),
        other = classified.other_objects.len(),
        "manifests classified"
    );
    classified
}

/// Read `paths` and classify their objects. Fails without partial output
/// if any document cannot be parsed.
pub fn classify_files<P: AsRef<Path>>(paths: &[P]) -> ManifestResult<ClassifiedManifests> {
    Ok(classify(read_manifests(paths)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ManifestError;
    use crate::manifest::parse_documents;
    use crate::types::SplitWeight;
    use std::fs;
    use tempfile::TempDir;

    const APP: &str = r#"
apiVersion: v1
kind: Service
metadata:
  name: nginx-service
spec:
  selector:
    app: nginx
  ports:
    - port: 80
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: nginx-deployment
spec:
  selector:
    matchLabels:
      app: nginx
  template:
    metadata:
      labels:
        app: nginx
    spec:
      containers:
        - name: nginx
          image: nginx:1.27
---
apiVersion: v1
kind: Service
metadata:
  name: external-db
spec:
  type: ExternalName
  externalName: db.example.com
---
apiVersion: v1
kind: Service
metadata:
  name: metrics
spec:
  selector:
    app: prometheus
---
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: nginx-ingress
spec:
  rules:
    - http:
        paths:
          - path: /
            pathType: Prefix
            backend:
              service:
                name: nginx-service
                port:
                  number: 80
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: nginx-config
data:
  worker_processes: "2"
"#;

    fn classified() -> ClassifiedManifests {
        classify(parse_documents(APP, Path::new("app.yaml")).unwrap())
    }

    #[test]
    fn buckets_objects_by_role() {
        let c = classified();
        assert_eq!(c.workloads().len(), 1);
        assert_eq!(c.ingresses().len(), 1);
        assert_eq!(c.other_objects().len(), 1);

        let routable: Vec<_> = c.routable_services().iter().map(|s| s.metadata.name.as_str()).collect();
        assert_eq!(routable, vec!["nginx-service"]);

        let unrouted: Vec<_> = c.unrouted_services().iter().map(|s| s.metadata.name.as_str()).collect();
        assert_eq!(unrouted, vec!["external-db", "metrics"]);
    }

    #[test]
    fn service_lookup_only_holds_routable_services() {
        let c = classified();
        assert!(c.service_by_name().contains_key("nginx-service"));
        assert!(!c.service_by_name().contains_key("metrics"));
        assert_eq!(c.service_by_name().len(), 1);
    }

    #[test]
    fn services_before_workloads_still_route() {
        // APP lists nginx-service ahead of its deployment.
        let c = classified();
        assert_eq!(c.routable_services()[0].metadata.name, "nginx-service");
    }

    #[test]
    fn selector_must_be_subset_of_pod_labels() {
        let yaml = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: api
spec:
  template:
    metadata:
      labels:
        app: api
        tier: backend
---
apiVersion: v1
kind: Service
metadata:
  name: api
spec:
  selector:
    app: api
---
apiVersion: v1
kind: Service
metadata:
  name: api-frontend
spec:
  selector:
    app: api
    tier: frontend
"#;
        let c = classify(parse_documents(yaml, Path::new("api.yaml")).unwrap());
        assert_eq!(c.routable_services().len(), 1);
        assert_eq!(c.unrouted_services()[0].metadata.name, "api-frontend");
    }

    #[test]
    fn traffic_splits_are_other_objects() {
        let yaml = r#"
apiVersion: split.smi-spec.io/v1alpha3
kind: TrafficSplit
metadata:
  name: web-trafficsplit
spec:
  service: web
  backends:
    - service: web-stable
      weight: 100
"#;
        let c = classify(parse_documents(yaml, Path::new("ts.yaml")).unwrap());
        assert_eq!(c.other_objects().len(), 1);
        assert!(c.other_objects()[0].as_traffic_split().is_some());
    }

    #[test]
    fn quantity_weight_splits_are_accepted() {
        let yaml = r#"
apiVersion: split.smi-spec.io/v1alpha1
kind: TrafficSplit
metadata:
  name: web-trafficsplit
spec:
  service: web
  backends:
    - service: web-stable
      weight: 500m
    - service: web-green
      weight: 500m
      port: 8080
"#;
        let c = classify(parse_documents(yaml, Path::new("split.yaml")).unwrap());
        let split = c.other_objects()[0].as_traffic_split().unwrap();
        assert_eq!(split.spec.backends[0].weight, SplitWeight::Quantity("500m".into()));
        assert_eq!(split.spec.backends[0].weight.units(), None);

        let yaml_out = serde_yaml::to_string(&c.other_objects()[0]).unwrap();
        assert!(yaml_out.contains("weight: 500m"));
        assert!(yaml_out.contains("port: 8080"));
    }

    #[test]
    fn classify_files_fails_on_any_bad_file() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.yaml");
        let bad = dir.path().join("bad.yaml");
        fs::write(&good, APP).unwrap();
        fs::write(&bad, "apiVersion: v1\nmetadata:\n  name: nokind\n").unwrap();

        let err = classify_files(&[&good, &bad]).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));

        let c = classify_files(&[&good]).unwrap();
        assert!(!c.is_empty());
    }

    #[test]
    fn object_views_are_copies() {
        let c = classified();
        let objects = c.workload_objects();
        assert_eq!(objects[0].name(), "nginx-deployment");
        assert_eq!(c.ingress_objects()[0].name(), "nginx-ingress");
        assert_eq!(c.routable_service_objects().len(), 1);
        assert_eq!(c.unrouted_service_objects().len(), 2);
    }
}
