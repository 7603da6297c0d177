//! Error types for rollout operations.

use bluegreen_core::ManifestError;
use thiserror::Error;

/// Result type alias for rollout operations.
pub type Result<T> = std::result::Result<T, RolloutError>;

#[derive(Debug, Error)]
pub enum RolloutError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("apply failed (exit code {exit_code}): {stderr}")]
    Apply { exit_code: i32, stderr: String },

    #[error("listing API versions failed (exit code {exit_code}): {stderr}")]
    ApiVersions { exit_code: i32, stderr: String },

    #[error("failed to run {command}: {reason}")]
    Exec { command: String, reason: String },

    #[error("cluster serves no {prefix} API version, cannot build TrafficSplit objects")]
    TrafficSplitUnavailable { prefix: &'static str },
}
