//! Cluster boundary: the only place that talks to the cluster.
//!
//! `ClusterClient` is the seam the rollout logic depends on. `Kubectl`
//! implements it by shelling out to the kubectl binary.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bluegreen_core::BlueGreenConfig;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, RolloutError};

/// Captured result of a cluster CLI invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Apply manifest files. `timeout` is forwarded as given; `None` means
    /// no timeout flag at all.
    async fn apply(&self, manifest_files: &[PathBuf], timeout: Option<&str>) -> Result<ExecOutput>;

    /// List the API group versions served by the cluster, one per line.
    async fn api_versions(&self) -> Result<ExecOutput>;
}

#[derive(Debug, Clone)]
pub struct Kubectl {
    binary: PathBuf,
    namespace: Option<String>,
    kubeconfig: Option<PathBuf>,
}

impl Kubectl {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            namespace: None,
            kubeconfig: None,
        }
    }

    pub fn from_config(config: &BlueGreenConfig) -> Self {
        let mut kubectl = Self::new(config.kubectl_binary());
        kubectl.namespace = config.namespace().map(str::to_string);
        kubectl.kubeconfig = config.kubeconfig().map(PathBuf::from);
        kubectl
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_kubeconfig(mut self, kubeconfig: impl Into<PathBuf>) -> Self {
        self.kubeconfig = Some(kubeconfig.into());
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn global_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(namespace) = &self.namespace {
            args.push(format!("--namespace={namespace}"));
        }
        if let Some(kubeconfig) = &self.kubeconfig {
            args.push(format!("--kubeconfig={}", kubeconfig.display()));
        }
        args
    }

    fn apply_args(&self, manifest_files: &[PathBuf], timeout: Option<&str>) -> Vec<String> {
        let files = manifest_files
            .iter()
            .map(|f| f.display().to_string())
            .collect::<Vec<_>>()
            .join(",");
        let mut args = vec!["apply".to_string(), "-f".to_string(), files];
        if let Some(timeout) = timeout {
            args.push(format!("--timeout={timeout}"));
        }
        args.extend(self.global_args());
        args
    }

    async fn run(&self, args: Vec<String>) -> Result<ExecOutput> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(&args);

        debug!(binary = %self.binary.display(), ?args, "running kubectl");

        let output = cmd.output().await.map_err(|e| RolloutError::Exec {
            command: format!("{} {}", self.binary.display(), args.join(" ")),
            reason: e.to_string(),
        })?;

        Ok(ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

impl Default for Kubectl {
    fn default() -> Self {
        Self::new("kubectl")
    }
}

#[async_trait]
impl ClusterClient for Kubectl {
    async fn apply(&self, manifest_files: &[PathBuf], timeout: Option<&str>) -> Result<ExecOutput> {
        self.run(self.apply_args(manifest_files, timeout)).await
    }

    async fn api_versions(&self) -> Result<ExecOutput> {
        let mut args = vec!["api-versions".to_string()];
        args.extend(self.global_args());
        self.run(args).await
    }
}
