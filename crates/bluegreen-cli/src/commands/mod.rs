pub mod classify;
pub mod deploy;
pub mod route;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use bluegreen_core::{expand_manifest_paths, BlueGreenConfig};
use bluegreen_rollout::{BlueGreenController, Kubectl, RolloutResult, RouteStrategy};
use tracing::debug;

use crate::RolloutArgs;

const DEFAULT_CONFIG: &str = "bluegreen.toml";

/// Load the config file, falling back to defaults when none is given and
/// `./bluegreen.toml` does not exist.
pub fn load_config(path: Option<&Path>) -> Result<BlueGreenConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None if Path::new(DEFAULT_CONFIG).is_file() => PathBuf::from(DEFAULT_CONFIG),
        None => return Ok(BlueGreenConfig::default()),
    };
    debug!(path = %path.display(), "loading config");
    BlueGreenConfig::from_file(&path).with_context(|| format!("reading {}", path.display()))
}

pub fn init(path: &Path, namespace: &str, strategy: &str) -> Result<()> {
    let config = BlueGreenConfig::scaffold(namespace, strategy);
    let output = path.join(DEFAULT_CONFIG);
    std::fs::write(&output, config.to_toml_string()?)
        .with_context(|| format!("writing {}", output.display()))?;
    println!("✓ Generated {}", output.display());
    Ok(())
}

/// Everything a deploy, route or restore run needs, with CLI flags taking
/// precedence over the config file.
pub struct Rollout {
    pub controller: BlueGreenController,
    pub manifests: Vec<PathBuf>,
    pub strategy: RouteStrategy,
    pub timeout: Option<String>,
}

impl Rollout {
    pub fn resolve(config: &BlueGreenConfig, args: &RolloutArgs) -> Result<Self> {
        let manifests = expand_manifest_paths(&args.filenames)?;
        if manifests.is_empty() {
            anyhow::bail!("no manifest files found in {:?}", args.filenames);
        }

        let mut kubectl = Kubectl::from_config(config);
        if let Some(namespace) = &args.namespace {
            kubectl = kubectl.with_namespace(namespace);
        }

        let strategy = args
            .strategy
            .as_deref()
            .or(config.strategy())
            .map(RouteStrategy::parse)
            .unwrap_or_default();
        let timeout = args
            .timeout
            .clone()
            .or_else(|| config.timeout().map(str::to_string));

        Ok(Self {
            controller: BlueGreenController::new(Arc::new(kubectl), config.manifest_writer()),
            manifests,
            strategy,
            timeout,
        })
    }
}

pub fn print_result(result: &RolloutResult, format: &str) -> Result<()> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        _ => {
            for object in &result.objects {
                println!("{}/{}", object.kind().to_lowercase(), object.name());
            }
            let stdout = result.apply_result.output.stdout.trim();
            if !stdout.is_empty() {
                println!("{stdout}");
            }
        }
    }
    Ok(())
}
