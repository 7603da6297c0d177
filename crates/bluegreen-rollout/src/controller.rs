//! Blue/green controller: entry point for deploy and route operations.
//!
//! The operations themselves live in `deploy`, `route` and `smi`; this
//! module only holds the state they share.

use std::sync::Arc;

use bluegreen_core::{BlueGreenConfig, ManifestWriter};
use tokio::sync::OnceCell;

use crate::apply::ObjectApplier;
use crate::cluster::{ClusterClient, Kubectl};

/// Drives blue/green deployments against one cluster.
///
/// Holds no per-rollout state: every call classifies its own manifests.
/// The only cached value is the TrafficSplit API version, looked up once.
pub struct BlueGreenController {
    pub(crate) applier: ObjectApplier,
    pub(crate) traffic_split_api_version: OnceCell<String>,
}

impl BlueGreenController {
    pub fn new(cluster: Arc<dyn ClusterClient>, writer: ManifestWriter) -> Self {
        Self {
            applier: ObjectApplier::new(cluster, writer),
            traffic_split_api_version: OnceCell::new(),
        }
    }

    /// Controller backed by kubectl as configured in `bluegreen.toml`.
    pub fn from_config(config: &BlueGreenConfig) -> Self {
        Self::new(Arc::new(Kubectl::from_config(config)), config.manifest_writer())
    }

    pub fn applier(&self) -> &ObjectApplier {
        &self.applier
    }
}
