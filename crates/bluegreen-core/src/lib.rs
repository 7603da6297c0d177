//! bluegreen-core: object model and manifest handling for blue/green rollouts.
//!
//! # Components
//!
//! - **`types`**: closed union of cluster object kinds
//! - **`labels`**: version label constants and copy-on-write labelling
//! - **`manifest`**: reading manifest files and writing objects back out
//! - **`classify`**: bucketing objects into workloads, services, ingresses
//! - **`config`**: `bluegreen.toml` parsing

pub mod classify;
pub mod config;
pub mod error;
pub mod labels;
pub mod manifest;
pub mod types;

pub use classify::{classify, classify_files, ClassifiedManifests};
pub use config::BlueGreenConfig;
pub use error::{ManifestError, ManifestResult};
pub use manifest::{expand_manifest_paths, read_manifests, ManifestWriter};
pub use types::*;
