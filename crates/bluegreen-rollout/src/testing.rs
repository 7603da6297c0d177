//! Shared unit-test scaffolding: a recording cluster and fixtures.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bluegreen_core::manifest::parse_documents;
use bluegreen_core::{classify, ClassifiedManifests, ClusterObject, ManifestWriter};
use tempfile::TempDir;

use crate::apply::ObjectApplier;
use crate::cluster::{ClusterClient, ExecOutput};
use crate::controller::BlueGreenController;
use crate::error::Result;

pub(crate) const FIXTURE: &str = include_str!("../tests/fixtures/test-ingress-new.yml");

pub(crate) const API_VERSIONS: &str = "apps/v1\nnetworking.k8s.io/v1\nsplit.smi-spec.io/v1alpha1\nsplit.smi-spec.io/v1alpha3\nv1\n";

pub(crate) fn fixture_objects() -> Vec<ClusterObject> {
    parse_documents(FIXTURE, Path::new("test-ingress-new.yml")).unwrap()
}

pub(crate) fn fixture_manifests() -> ClassifiedManifests {
    classify(fixture_objects())
}

#[derive(Debug, Clone)]
pub(crate) struct ApplyCall {
    pub files: Vec<PathBuf>,
    pub timeout: Option<String>,
}

/// Cluster double that records every apply and answers with a fixed exit code.
pub(crate) struct RecordingCluster {
    exit_code: i32,
    api_versions: String,
    calls: Mutex<Vec<ApplyCall>>,
    api_version_calls: AtomicUsize,
}

impl RecordingCluster {
    pub fn new(exit_code: i32, api_versions: &str) -> Self {
        Self {
            exit_code,
            api_versions: api_versions.to_string(),
            calls: Mutex::new(Vec::new()),
            api_version_calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> Vec<ApplyCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn api_version_calls(&self) -> usize {
        self.api_version_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClusterClient for RecordingCluster {
    async fn apply(&self, manifest_files: &[PathBuf], timeout: Option<&str>) -> Result<ExecOutput> {
        self.calls.lock().unwrap().push(ApplyCall {
            files: manifest_files.to_vec(),
            timeout: timeout.map(str::to_string),
        });
        Ok(if self.exit_code == 0 {
            ExecOutput {
                stdout: "deployment.apps/nginx-deployment created".into(),
                stderr: String::new(),
                exit_code: 0,
            }
        } else {
            ExecOutput {
                stdout: String::new(),
                stderr: "error: deployment failed".into(),
                exit_code: self.exit_code,
            }
        })
    }

    async fn api_versions(&self) -> Result<ExecOutput> {
        self.api_version_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ExecOutput {
            stdout: self.api_versions.clone(),
            stderr: String::new(),
            exit_code: 0,
        })
    }
}

pub(crate) struct Harness {
    pub cluster: Arc<RecordingCluster>,
    pub controller: BlueGreenController,
    pub dir: TempDir,
}

impl Harness {
    pub fn with_cluster(cluster: RecordingCluster) -> Self {
        let dir = TempDir::new().unwrap();
        let cluster = Arc::new(cluster);
        let controller =
            BlueGreenController::new(cluster.clone(), ManifestWriter::new(dir.path().join("out")));
        Self {
            cluster,
            controller,
            dir,
        }
    }

    pub fn new() -> Self {
        Self::with_cluster(RecordingCluster::new(0, API_VERSIONS))
    }

    pub fn failing() -> Self {
        Self::with_cluster(RecordingCluster::new(1, API_VERSIONS))
    }

    pub fn applier(&self) -> &ObjectApplier {
        self.controller.applier()
    }

    /// Copy the fixture into the harness directory and return its path.
    pub fn fixture_file(&self) -> PathBuf {
        let path = self.dir.path().join("test-ingress-new.yml");
        std::fs::write(&path, FIXTURE).unwrap();
        path
    }
}
