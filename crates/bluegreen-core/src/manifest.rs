//! Manifest file I/O.
//!
//! Reading accepts multi-document YAML (JSON is valid YAML). Writing
//! materialises in-memory objects as one file per object so they can be
//! handed to the cluster CLI.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use serde_yaml::Value;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{ManifestError, ManifestResult};
use crate::types::ClusterObject;

const MANIFEST_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Expand directories into the manifest files they contain.
///
/// Plain files are kept as given. Directories are walked recursively and
/// contribute every `.yaml`, `.yml` and `.json` file, sorted by name.
pub fn expand_manifest_paths<P: AsRef<Path>>(paths: &[P]) -> ManifestResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if !path.is_dir() {
            files.push(path.to_path_buf());
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|e| ManifestError::Read {
                path: path.to_path_buf(),
                source: e.into(),
            })?;
            let is_manifest = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| MANIFEST_EXTENSIONS.contains(&ext));
            if entry.file_type().is_file() && is_manifest {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

/// Parse every document in `content`. Empty documents are skipped.
pub fn parse_documents(content: &str, path: &Path) -> ManifestResult<Vec<ClusterObject>> {
    let mut objects = Vec::new();
    for document in serde_yaml::Deserializer::from_str(content) {
        let value = Value::deserialize(document).map_err(|e| ManifestError::parse(path, e))?;
        if value.is_null() {
            continue;
        }
        let object = ClusterObject::from_value(value).map_err(|e| ManifestError::parse(path, e))?;
        objects.push(object);
    }
    Ok(objects)
}

/// Read and parse manifest files, preserving file and document order.
pub fn read_manifests<P: AsRef<Path>>(paths: &[P]) -> ManifestResult<Vec<ClusterObject>> {
    let mut objects = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        objects.extend(parse_documents(&content, path)?);
    }
    debug!(files = paths.len(), objects = objects.len(), "manifests parsed");
    Ok(objects)
}

/// Writes objects back to manifest files under a fixed directory.
///
/// Cheap to clone; clones share the file sequence counter.
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    dir: PathBuf,
    sequence: Arc<AtomicU64>,
}

impl ManifestWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Writer rooted at `$TMPDIR/bluegreen`.
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir().join("bluegreen"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write each object to its own `<kind>_<name>_<millis>_<seq>.yaml`.
    pub fn write_objects(&self, objects: &[ClusterObject]) -> ManifestResult<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir).map_err(|source| ManifestError::Write {
            path: self.dir.clone(),
            source,
        })?;

        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        let files = objects
            .iter()
            .map(|object| {
                let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
                let path = self
                    .dir
                    .join(format!("{}_{}_{}_{}.yaml", object.kind(), object.name(), stamp, seq));
                let body = serde_yaml::to_string(object)
                    .map_err(|e| ManifestError::Serialize(e.to_string()))?;
                fs::write(&path, body).map_err(|source| ManifestError::Write {
                    path: path.clone(),
                    source,
                })?;
                Ok(path)
            })
            .collect::<ManifestResult<Vec<_>>>()?;

        debug!(dir = ?self.dir, count = files.len(), "objects written");
        Ok(files)
    }
}
