//! Service mesh (SMI) routing via TrafficSplit objects.
//!
//! Each routable service `<svc>` gets two backing services, `<svc>-stable`
//! and `<svc>-green`, and a `<svc>-trafficsplit` object that weights
//! traffic for `<svc>` between them.

use bluegreen_core::labels::{
    blue_green_name, new_blue_green_object, with_version_label, GREEN_LABEL_VALUE, GREEN_SUFFIX,
    NONE_LABEL_VALUE, STABLE_SUFFIX, TRAFFIC_SPLIT_SUFFIX,
};
use bluegreen_core::{
    ClusterObject, Extra, ObjectMeta, Service, TrafficSplit, TrafficSplitBackend, TrafficSplitSpec,
};
use tracing::{debug, info};

use crate::controller::BlueGreenController;
use crate::error::{Result, RolloutError};
use crate::result::RolloutResult;

pub const TRAFFIC_SPLIT_API_PREFIX: &str = "split.smi-spec.io";
pub const TRAFFIC_SPLIT_KIND: &str = "TrafficSplit";

pub const MIN_WEIGHT: u32 = 0;
pub const MAX_WEIGHT: u32 = 100;

/// Pick the TrafficSplit API version from `kubectl api-versions` output.
///
/// The output is sorted, so the last matching line is the newest version.
pub fn parse_traffic_split_api_version(api_versions: &str) -> Option<String> {
    api_versions
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(TRAFFIC_SPLIT_API_PREFIX))
        .next_back()
        .map(str::to_string)
}

/// `(stable, green)` weights for a target label.
fn split_weights(label_value: &str) -> (u32, u32) {
    if label_value == GREEN_LABEL_VALUE {
        (MIN_WEIGHT, MAX_WEIGHT)
    } else {
        (MAX_WEIGHT, MIN_WEIGHT)
    }
}

fn stable_smi_service(service: &Service) -> ClusterObject {
    let mut object = with_version_label(&service.clone().into(), NONE_LABEL_VALUE);
    let metadata = object.metadata_mut();
    metadata.name = blue_green_name(&metadata.name, STABLE_SUFFIX);
    object
}

fn green_smi_service(service: &Service) -> ClusterObject {
    new_blue_green_object(&service.clone().into(), GREEN_LABEL_VALUE)
}

impl BlueGreenController {
    async fn traffic_split_api_version(&self) -> Result<&str> {
        let version = self
            .traffic_split_api_version
            .get_or_try_init(|| async {
                let output = self.applier.cluster().api_versions().await?;
                if !output.success() {
                    return Err(RolloutError::ApiVersions {
                        exit_code: output.exit_code,
                        stderr: output.stderr,
                    });
                }
                let version = parse_traffic_split_api_version(&output.stdout).ok_or(
                    RolloutError::TrafficSplitUnavailable {
                        prefix: TRAFFIC_SPLIT_API_PREFIX,
                    },
                )?;
                debug!(%version, "discovered TrafficSplit API version");
                Ok::<_, RolloutError>(version)
            })
            .await?;
        Ok(version.as_str())
    }

    /// Build (without applying) the TrafficSplit for `service_name`.
    ///
    /// The green label sends all traffic to `<svc>-green`; any other label
    /// sends it all to `<svc>-stable`.
    pub async fn create_traffic_split_object(
        &self,
        service_name: &str,
        label_value: &str,
    ) -> Result<TrafficSplit> {
        let api_version = self.traffic_split_api_version().await?;
        let (stable_weight, green_weight) = split_weights(label_value);

        Ok(TrafficSplit {
            api_version: api_version.to_string(),
            kind: TRAFFIC_SPLIT_KIND.to_string(),
            metadata: ObjectMeta::named(blue_green_name(service_name, TRAFFIC_SPLIT_SUFFIX)),
            spec: TrafficSplitSpec {
                service: service_name.to_string(),
                backends: vec![
                    TrafficSplitBackend::new(
                        blue_green_name(service_name, STABLE_SUFFIX),
                        stable_weight,
                    ),
                    TrafficSplitBackend::new(
                        blue_green_name(service_name, GREEN_SUFFIX),
                        green_weight,
                    ),
                ],
                extra: Extra::new(),
            },
            extra: Extra::new(),
        })
    }

    /// Apply one TrafficSplit per service, all in a single batch.
    pub async fn route_blue_green_smi(
        &self,
        label_value: &str,
        services: &[Service],
        timeout: Option<&str>,
    ) -> Result<RolloutResult> {
        let mut objects = Vec::with_capacity(services.len());
        for service in services {
            let split = self
                .create_traffic_split_object(&service.metadata.name, label_value)
                .await?;
            objects.push(ClusterObject::from(split));
        }

        info!(count = objects.len(), label = label_value, "applying traffic splits");
        let apply_result = self.applier.apply(&objects, timeout).await?;
        Ok(RolloutResult::new(apply_result, objects))
    }

    /// Create the `-stable` and `-green` backing services the traffic splits
    /// point at.
    pub async fn setup_smi(&self, services: &[Service], timeout: Option<&str>) -> Result<RolloutResult> {
        let objects: Vec<ClusterObject> = services
            .iter()
            .map(stable_smi_service)
            .chain(services.iter().map(green_smi_service))
            .collect();

        debug!(count = objects.len(), "creating mesh backing services");
        let apply_result = self.applier.apply(&objects, timeout).await?;
        Ok(RolloutResult::new(apply_result, objects))
    }
}
