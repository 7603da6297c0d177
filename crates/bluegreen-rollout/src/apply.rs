//! Applying object batches and green labelling.

use std::sync::Arc;

use bluegreen_core::labels::new_blue_green_object;
use bluegreen_core::{ClusterObject, ManifestWriter};
use tracing::{debug, info, warn};

use crate::cluster::ClusterClient;
use crate::error::{Result, RolloutError};
use crate::result::{ApplyResult, RolloutResult};

/// Writes objects to manifest files and applies them in a single call.
#[derive(Clone)]
pub struct ObjectApplier {
    cluster: Arc<dyn ClusterClient>,
    writer: ManifestWriter,
}

impl ObjectApplier {
    pub fn new(cluster: Arc<dyn ClusterClient>, writer: ManifestWriter) -> Self {
        Self { cluster, writer }
    }

    pub fn cluster(&self) -> &dyn ClusterClient {
        self.cluster.as_ref()
    }

    /// Apply `objects` as one batch. No retry: a failed apply is returned
    /// as `RolloutError::Apply` after the single attempt.
    pub async fn apply(&self, objects: &[ClusterObject], timeout: Option<&str>) -> Result<ApplyResult> {
        if objects.is_empty() {
            debug!("empty batch, nothing to apply");
            return Ok(ApplyResult::default());
        }

        let manifest_files = self.writer.write_objects(objects)?;
        info!(count = objects.len(), ?timeout, "applying objects");

        let output = self.cluster.apply(&manifest_files, timeout).await?;
        if !output.success() {
            warn!(
                exit_code = output.exit_code,
                stderr = %output.stderr.trim(),
                "apply failed"
            );
            return Err(RolloutError::Apply {
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        debug!(files = ?manifest_files, "objects applied");
        Ok(ApplyResult {
            output,
            manifest_files,
        })
    }

    /// Apply labelled copies of `objects`.
    ///
    /// With the green label each copy is renamed `<name>-green`, so the new
    /// version runs next to the stable one. The originals are not modified.
    pub async fn deploy_with_label(
        &self,
        objects: &[ClusterObject],
        label_value: &str,
        timeout: Option<&str>,
    ) -> Result<RolloutResult> {
        let labelled: Vec<ClusterObject> = objects
            .iter()
            .map(|object| new_blue_green_object(object, label_value))
            .collect();

        debug!(count = labelled.len(), label = label_value, "deploying labelled objects");
        let apply_result = self.apply(&labelled, timeout).await?;
        Ok(RolloutResult::new(apply_result, labelled))
    }
}
