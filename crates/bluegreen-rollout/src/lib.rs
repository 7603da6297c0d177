//! Blue/green rollouts for Kubernetes manifests.
//!
//! A rollout stands up a green copy of the workloads described by a set of
//! manifest files, then moves live traffic onto it with one of three
//! route strategies: flipping service selectors, rewriting ingress
//! backends, or weighting SMI traffic splits.
//!
//! # Components
//!
//! - **`cluster`**: the cluster boundary (`ClusterClient`, kubectl adapter)
//! - **`apply`**: write objects to manifest files and apply them in one batch
//! - **`controller`**: shared controller state
//! - **`deploy`**: per-strategy deploy phases
//! - **`route`**: ingress and service cut-over, strategy dispatch
//! - **`smi`**: traffic splits and mesh backing services
//! - **`strategy`**: route strategy selection

pub mod apply;
pub mod cluster;
pub mod controller;
pub mod deploy;
pub mod error;
pub mod result;
pub mod route;
pub mod smi;
pub mod strategy;

#[cfg(test)]
mod testing;

pub use apply::ObjectApplier;
pub use cluster::{ClusterClient, ExecOutput, Kubectl};
pub use controller::BlueGreenController;
pub use error::{Result, RolloutError};
pub use result::{ApplyResult, RolloutResult};
pub use route::green_ingress;
pub use strategy::RouteStrategy;
