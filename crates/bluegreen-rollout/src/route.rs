//! Traffic cut-over for the ingress and service strategies, plus the
//! strategy dispatcher.

use std::collections::BTreeMap;
use std::path::Path;

use bluegreen_core::labels::{
    add_version_label, blue_green_name, GREEN_LABEL_VALUE, GREEN_SUFFIX, NONE_LABEL_VALUE,
    VERSION_LABEL,
};
use bluegreen_core::{classify_files, ClusterObject, Ingress, IngressBackend, Service};
use tracing::{debug, info};

use crate::controller::BlueGreenController;
use crate::error::Result;
use crate::result::RolloutResult;
use crate::strategy::RouteStrategy;

/// Copy of `ingress` with every backend that names a routable service
/// pointed at `<service>-green`.
///
/// Returns `None` when no backend is routable; such ingresses are applied
/// unchanged so unrelated backends keep working.
pub fn green_ingress(ingress: &Ingress, service_by_name: &BTreeMap<String, Service>) -> Option<Ingress> {
    let routed = ingress
        .backends()
        .filter_map(IngressBackend::service_name)
        .any(|name| service_by_name.contains_key(name));
    if !routed {
        return None;
    }

    let mut copy = ingress.clone();
    for backend in copy.backends_mut() {
        let green = backend
            .service_name()
            .filter(|name| service_by_name.contains_key(*name))
            .map(|name| blue_green_name(name, GREEN_SUFFIX));
        if let Some(green) = green {
            backend.set_service_name(green);
        }
    }
    copy.metadata
        .labels
        .insert(VERSION_LABEL.to_string(), GREEN_LABEL_VALUE.to_string());
    Some(copy)
}

impl BlueGreenController {
    /// Classify `paths` and cut traffic over to green with `strategy`.
    ///
    /// Always reads the files itself so it can run on its own, outside of
    /// `deploy_blue_green`.
    pub async fn route_blue_green_for_deploy<P: AsRef<Path>>(
        &self,
        paths: &[P],
        strategy: RouteStrategy,
        timeout: Option<&str>,
    ) -> Result<RolloutResult> {
        let manifests = classify_files(paths)?;
        info!(%strategy, "routing blue/green traffic");

        match strategy {
            RouteStrategy::Ingress => {
                self.route_blue_green_ingress(
                    manifests.service_by_name(),
                    manifests.ingresses(),
                    timeout,
                )
                .await
            }
            RouteStrategy::ServiceMesh => {
                self.route_blue_green_smi(GREEN_LABEL_VALUE, manifests.routable_services(), timeout)
                    .await
            }
            RouteStrategy::Service => {
                self.route_blue_green_service(
                    GREEN_LABEL_VALUE,
                    manifests.routable_services(),
                    timeout,
                )
                .await
            }
        }
    }

    /// Send traffic back to the stable objects described by `paths`.
    ///
    /// Ingresses are applied as written, services get their selector
    /// version label reset, and traffic splits put all weight on `-stable`.
    pub async fn route_blue_green_to_stable<P: AsRef<Path>>(
        &self,
        paths: &[P],
        strategy: RouteStrategy,
        timeout: Option<&str>,
    ) -> Result<RolloutResult> {
        let manifests = classify_files(paths)?;
        info!(%strategy, "routing traffic back to stable");

        match strategy {
            RouteStrategy::Ingress => {
                self.route_blue_green_ingress_unchanged(manifests.ingresses(), timeout)
                    .await
            }
            RouteStrategy::ServiceMesh => {
                self.route_blue_green_smi(NONE_LABEL_VALUE, manifests.routable_services(), timeout)
                    .await
            }
            RouteStrategy::Service => {
                self.route_blue_green_service(
                    NONE_LABEL_VALUE,
                    manifests.routable_services(),
                    timeout,
                )
                .await
            }
        }
    }

    /// Rewrite routable ingress backends to their green services and apply
    /// all ingresses in one batch, in input order.
    pub async fn route_blue_green_ingress(
        &self,
        service_by_name: &BTreeMap<String, Service>,
        ingresses: &[Ingress],
        timeout: Option<&str>,
    ) -> Result<RolloutResult> {
        let objects: Vec<ClusterObject> = ingresses
            .iter()
            .map(|ingress| match green_ingress(ingress, service_by_name) {
                Some(routed) => routed.into(),
                None => {
                    debug!(ingress = %ingress.metadata.name, "unrouted ingress left unchanged");
                    ingress.clone().into()
                }
            })
            .collect();

        let apply_result = self.applier.apply(&objects, timeout).await?;
        Ok(RolloutResult::new(apply_result, objects))
    }

    /// Apply the ingresses exactly as given, keeping traffic on the stable
    /// backends.
    pub async fn route_blue_green_ingress_unchanged(
        &self,
        ingresses: &[Ingress],
        timeout: Option<&str>,
    ) -> Result<RolloutResult> {
        let objects: Vec<ClusterObject> = ingresses.iter().cloned().map(Into::into).collect();
        let apply_result = self.applier.apply(&objects, timeout).await?;
        Ok(RolloutResult::new(apply_result, objects))
    }

    /// Set the version label of each service (metadata and selector) to
    /// `label_value` so the unchanged service name selects those pods.
    pub async fn route_blue_green_service(
        &self,
        label_value: &str,
        services: &[Service],
        timeout: Option<&str>,
    ) -> Result<RolloutResult> {
        let objects: Vec<ClusterObject> = services
            .iter()
            .map(|service| {
                let mut object = ClusterObject::from(service.clone());
                add_version_label(&mut object, label_value);
                object
            })
            .collect();

        let apply_result = self.applier.apply(&objects, timeout).await?;
        Ok(RolloutResult::new(apply_result, objects))
    }
}
