//! Blue/green deployment: stand up green, then cut traffic over.
//!
//! Phase order per strategy:
//!
//! | strategy | stand up | supporting objects | cut-over |
//! |---|---|---|---|
//! | service | green workloads | other, ingresses, unrouted services | service selector flip |
//! | ingress | green workloads + green services | other, unrouted services | ingress rewrite |
//! | smi | other, services, ingresses, unrouted services | mesh services, then green workloads | traffic splits |
//!
//! Routing objects never reference something that is not applied yet.
//! Every phase is awaited before the next starts and the first failure
//! aborts the whole call; nothing already applied is rolled back.

use std::path::Path;

use bluegreen_core::labels::GREEN_LABEL_VALUE;
use bluegreen_core::{classify_files, ClusterObject};
use tracing::info;

use crate::controller::BlueGreenController;
use crate::error::Result;
use crate::result::RolloutResult;
use crate::strategy::RouteStrategy;

impl BlueGreenController {
    /// Deploy green with the strategy's subroutine, then route traffic to it.
    ///
    /// The returned result holds the deploy phases followed by the routing
    /// phase. Its process output is the green-workload apply's; when that
    /// batch was empty and nothing was applied, the output of the next phase
    /// that did apply is reported instead.
    pub async fn deploy_blue_green<P: AsRef<Path>>(
        &self,
        paths: &[P],
        strategy: RouteStrategy,
        timeout: Option<&str>,
    ) -> Result<RolloutResult> {
        info!(%strategy, files = paths.len(), "starting blue/green deployment");

        let deployment = match strategy {
            RouteStrategy::Ingress => self.deploy_blue_green_ingress(paths, timeout).await?,
            RouteStrategy::ServiceMesh => self.deploy_blue_green_smi(paths, timeout).await?,
            RouteStrategy::Service => self.deploy_blue_green_service(paths, timeout).await?,
        };

        let routing = self
            .route_blue_green_for_deploy(paths, strategy, timeout)
            .await?;

        let result = deployment.concat(routing);
        info!(
            %strategy,
            objects = result.objects.len(),
            manifests = result.manifest_files().len(),
            "blue/green deployment routed"
        );
        Ok(result)
    }

    /// Service strategy: green workloads first, then everything the
    /// selector flip does not touch.
    pub async fn deploy_blue_green_service<P: AsRef<Path>>(
        &self,
        paths: &[P],
        timeout: Option<&str>,
    ) -> Result<RolloutResult> {
        let manifests = classify_files(paths)?;

        let workloads = self
            .applier
            .deploy_with_label(&manifests.workload_objects(), GREEN_LABEL_VALUE, timeout)
            .await?;

        let supporting: Vec<ClusterObject> = manifests
            .other_objects()
            .iter()
            .cloned()
            .chain(manifests.ingress_objects())
            .chain(manifests.unrouted_service_objects())
            .collect();
        let supporting_result = self.applier.apply(&supporting, timeout).await?;

        Ok(workloads.concat(RolloutResult::new(supporting_result, supporting)))
    }

    /// Ingress strategy: a parallel `-green` workload and service pair,
    /// then the objects the ingress rewrite does not touch.
    pub async fn deploy_blue_green_ingress<P: AsRef<Path>>(
        &self,
        paths: &[P],
        timeout: Option<&str>,
    ) -> Result<RolloutResult> {
        let manifests = classify_files(paths)?;

        let services_and_workloads: Vec<ClusterObject> = manifests
            .workload_objects()
            .into_iter()
            .chain(manifests.routable_service_objects())
            .collect();
        let workloads = self
            .applier
            .deploy_with_label(&services_and_workloads, GREEN_LABEL_VALUE, timeout)
            .await?;

        let supporting: Vec<ClusterObject> = manifests
            .other_objects()
            .iter()
            .cloned()
            .chain(manifests.unrouted_service_objects())
            .collect();
        let supporting_result = self.applier.apply(&supporting, timeout).await?;

        Ok(workloads.concat(RolloutResult::new(supporting_result, supporting)))
    }

    /// SMI strategy: services and supporting objects first so the mesh
    /// services and traffic splits only reference existing objects, then
    /// the green workloads.
    pub async fn deploy_blue_green_smi<P: AsRef<Path>>(
        &self,
        paths: &[P],
        timeout: Option<&str>,
    ) -> Result<RolloutResult> {
        let manifests = classify_files(paths)?;

        let supporting: Vec<ClusterObject> = manifests
            .other_objects()
            .iter()
            .cloned()
            .chain(manifests.routable_service_objects())
            .chain(manifests.ingress_objects())
            .chain(manifests.unrouted_service_objects())
            .collect();
        let supporting_result = self.applier.apply(&supporting, timeout).await?;

        let mesh = self
            .setup_smi(manifests.routable_services(), timeout)
            .await?;

        let workloads = self
            .applier
            .deploy_with_label(&manifests.workload_objects(), GREEN_LABEL_VALUE, timeout)
            .await?;

        Ok(workloads
            .concat(RolloutResult::new(supporting_result, supporting))
            .concat(mesh))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RolloutError;
    use crate::testing::Harness;
    use bluegreen_core::manifest::parse_documents;
    use bluegreen_core::ObjectKind;

    const EXTRA: &str = r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: nginx-config
data:
  mode: production
---
apiVersion: v1
kind: Service
metadata:
  name: legacy-backend
spec:
  type: ExternalName
  externalName: legacy.example.com
"#;

    fn manifest_files(harness: &Harness) -> Vec<std::path::PathBuf> {
        let extra = harness.dir.path().join("extra.yaml");
        std::fs::write(&extra, EXTRA).unwrap();
        assert_eq!(parse_documents(EXTRA, &extra).unwrap().len(), 2);
        vec![harness.fixture_file(), extra]
    }

    /// Names of the objects written for each apply call, in call order.
    fn applied_batches(harness: &Harness) -> Vec<Vec<String>> {
        harness
            .cluster
            .calls()
            .iter()
            .map(|call| {
                bluegreen_core::read_manifests(&call.files)
                    .unwrap()
                    .iter()
                    .map(|o| o.name().to_string())
                    .collect()
            })
            .collect()
    }

    #[tokio::test]
    async fn service_strategy_phases() {
        let harness = Harness::new();
        let files = manifest_files(&harness);

        let result = harness
            .controller
            .deploy_blue_green(&files, RouteStrategy::Service, Some("60s"))
            .await
            .unwrap();

        assert_eq!(
            applied_batches(&harness),
            vec![
                vec!["nginx-deployment-green"],
                vec!["nginx-config", "nginx-ingress", "legacy-backend"],
                vec!["nginx-service"],
            ]
        );
        assert_eq!(
            result.object_names(),
            vec![
                "nginx-deployment-green",
                "nginx-config",
                "nginx-ingress",
                "legacy-backend",
                "nginx-service",
            ]
        );
        assert_eq!(result.manifest_files().len(), 5);
        assert!(harness
            .cluster
            .calls()
            .iter()
            .all(|call| call.timeout.as_deref() == Some("60s")));
    }

    #[tokio::test]
    async fn ingress_strategy_phases() {
        let harness = Harness::new();
        let files = manifest_files(&harness);

        let result = harness
            .controller
            .deploy_blue_green(&files, RouteStrategy::Ingress, None)
            .await
            .unwrap();

        assert_eq!(
            applied_batches(&harness),
            vec![
                vec!["nginx-deployment-green", "nginx-service-green"],
                vec!["nginx-config", "legacy-backend"],
                vec!["nginx-ingress"],
            ]
        );
        let ingress = result.objects.last().unwrap().as_ingress().unwrap();
        let backend = ingress.backends().next().unwrap();
        assert_eq!(backend.service_name(), Some("nginx-service-green"));
        assert!(harness.cluster.calls().iter().all(|call| call.timeout.is_none()));
    }

    #[tokio::test]
    async fn smi_strategy_phases() {
        let harness = Harness::new();
        let files = manifest_files(&harness);

        let result = harness
            .controller
            .deploy_blue_green(&files, RouteStrategy::ServiceMesh, None)
            .await
            .unwrap();

        assert_eq!(
            applied_batches(&harness),
            vec![
                vec!["nginx-config", "nginx-service", "nginx-ingress", "legacy-backend"],
                vec!["nginx-service-stable", "nginx-service-green"],
                vec!["nginx-deployment-green"],
                vec!["nginx-service-trafficsplit"],
            ]
        );
        assert_eq!(result.objects[0].name(), "nginx-deployment-green");
        let last = result.objects.last().unwrap();
        assert_eq!(last.object_kind(), ObjectKind::TrafficSplit);
        assert_eq!(result.manifest_files().len(), 8);
    }

    #[tokio::test]
    async fn output_falls_back_when_no_workloads_are_deployed() {
        let harness = Harness::new();
        let config_only = harness.dir.path().join("config.yaml");
        std::fs::write(&config_only, "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: settings\n").unwrap();

        let result = harness
            .controller
            .deploy_blue_green_service(&[&config_only], None)
            .await
            .unwrap();

        assert_eq!(harness.cluster.calls().len(), 1);
        assert_eq!(result.object_names(), vec!["settings"]);
        assert!(result.apply_result.output.success());
        assert!(!result.apply_result.output.stdout.is_empty());
    }

    #[tokio::test]
    async fn failure_aborts_after_first_apply() {
        let harness = Harness::failing();
        let files = manifest_files(&harness);

        let err = harness
            .controller
            .deploy_blue_green(&files, RouteStrategy::Ingress, None)
            .await
            .unwrap_err();

        assert!(matches!(err, RolloutError::Apply { .. }));
        assert_eq!(harness.cluster.calls().len(), 1);
    }

    #[tokio::test]
    async fn deploy_does_not_modify_manifest_files() {
        let harness = Harness::new();
        let files = manifest_files(&harness);
        let before: Vec<_> = files.iter().map(|f| std::fs::read_to_string(f).unwrap()).collect();

        harness
            .controller
            .deploy_blue_green(&files, RouteStrategy::ServiceMesh, None)
            .await
            .unwrap();

        let after: Vec<_> = files.iter().map(|f| std::fs::read_to_string(f).unwrap()).collect();
        assert_eq!(before, after);
    }
}
