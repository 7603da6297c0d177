//! bluegreen.toml configuration parser.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::manifest::ManifestWriter;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlueGreenConfig {
    pub kubectl: Option<KubectlConfig>,
    pub rollout: Option<RolloutConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KubectlConfig {
    /// kubectl binary, looked up on PATH when not absolute.
    pub binary: Option<String>,
    pub namespace: Option<String>,
    pub kubeconfig: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolloutConfig {
    /// `ingress`, `smi` or `service`.
    pub strategy: Option<String>,
    /// Passed verbatim to every apply, e.g. `240s`.
    pub timeout: Option<String>,
    /// Where rewritten manifests are written before apply.
    pub manifest_dir: Option<String>,
}

impl BlueGreenConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BlueGreenConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// A fully populated config with the defaults spelled out.
    pub fn scaffold(namespace: &str, strategy: &str) -> Self {
        BlueGreenConfig {
            kubectl: Some(KubectlConfig {
                binary: Some("kubectl".to_string()),
                namespace: Some(namespace.to_string()),
                kubeconfig: None,
            }),
            rollout: Some(RolloutConfig {
                strategy: Some(strategy.to_string()),
                timeout: Some("240s".to_string()),
                manifest_dir: None,
            }),
        }
    }

    pub fn kubectl_binary(&self) -> &str {
        self.kubectl
            .as_ref()
            .and_then(|k| k.binary.as_deref())
            .unwrap_or("kubectl")
    }

    pub fn namespace(&self) -> Option<&str> {
        self.kubectl.as_ref().and_then(|k| k.namespace.as_deref())
    }

    pub fn kubeconfig(&self) -> Option<&str> {
        self.kubectl.as_ref().and_then(|k| k.kubeconfig.as_deref())
    }

    pub fn strategy(&self) -> Option<&str> {
        self.rollout.as_ref().and_then(|r| r.strategy.as_deref())
    }

    pub fn timeout(&self) -> Option<&str> {
        self.rollout.as_ref().and_then(|r| r.timeout.as_deref())
    }

    pub fn manifest_dir(&self) -> Option<PathBuf> {
        self.rollout
            .as_ref()
            .and_then(|r| r.manifest_dir.as_ref())
            .map(PathBuf::from)
    }

    /// Writer for the configured manifest directory, or the temp default.
    pub fn manifest_writer(&self) -> ManifestWriter {
        match self.manifest_dir() {
            Some(dir) => ManifestWriter::new(dir),
            None => ManifestWriter::in_temp_dir(),
        }
    }
}
