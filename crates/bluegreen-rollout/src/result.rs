//! Owned results of apply batches and rollout phases.
//!
//! Phases never share collections: combining two results consumes both
//! and yields a new one.

use std::path::PathBuf;

use bluegreen_core::ClusterObject;

use crate::cluster::ExecOutput;

/// Outcome of one apply batch.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ApplyResult {
    pub output: ExecOutput,
    pub manifest_files: Vec<PathBuf>,
}

impl ApplyResult {
    /// True when no apply was performed (empty batch).
    pub fn is_empty(&self) -> bool {
        self.manifest_files.is_empty() && self.output == ExecOutput::default()
    }

    /// Combine two results. The first non-empty result provides the
    /// process output; manifest files are concatenated in order.
    pub fn concat(self, other: ApplyResult) -> ApplyResult {
        let output = if self.is_empty() {
            other.output
        } else {
            self.output
        };
        ApplyResult {
            output,
            manifest_files: self
                .manifest_files
                .into_iter()
                .chain(other.manifest_files)
                .collect(),
        }
    }
}

/// Objects produced by a deploy or route step plus how they were applied.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct RolloutResult {
    pub apply_result: ApplyResult,
    pub objects: Vec<ClusterObject>,
}

impl RolloutResult {
    pub fn new(apply_result: ApplyResult, objects: Vec<ClusterObject>) -> Self {
        Self {
            apply_result,
            objects,
        }
    }

    pub fn concat(self, other: RolloutResult) -> RolloutResult {
        RolloutResult {
            apply_result: self.apply_result.concat(other.apply_result),
            objects: self.objects.into_iter().chain(other.objects).collect(),
        }
    }

    pub fn manifest_files(&self) -> &[PathBuf] {
        &self.apply_result.manifest_files
    }

    pub fn object_names(&self) -> Vec<&str> {
        self.objects.iter().map(ClusterObject::name).collect()
    }
}
