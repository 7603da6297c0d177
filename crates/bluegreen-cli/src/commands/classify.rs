use std::path::PathBuf;

use bluegreen_core::{classify_files, expand_manifest_paths, ClassifiedManifests, Service};

pub fn classify(filenames: &[PathBuf], format: &str) -> anyhow::Result<()> {
    let files = expand_manifest_paths(filenames)?;
    let manifests = classify_files(&files)?;
    if manifests.is_empty() {
        anyhow::bail!("no cluster objects found in {:?}", filenames);
    }

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summary(&manifests))?);
        }
        _ => {
            for (bucket, objects) in buckets(&manifests) {
                println!("{bucket} ({}):", objects.len());
                for name in objects {
                    println!("  {name}");
                }
            }
        }
    }

    Ok(())
}

fn buckets(manifests: &ClassifiedManifests) -> Vec<(&'static str, Vec<&str>)> {
    vec![
        (
            "workloads",
            manifests.workloads().iter().map(|w| w.metadata.name.as_str()).collect(),
        ),
        ("routable_services", service_names(manifests.routable_services())),
        (
            "ingresses",
            manifests.ingresses().iter().map(|i| i.metadata.name.as_str()).collect(),
        ),
        ("unrouted_services", service_names(manifests.unrouted_services())),
        ("other", manifests.other_objects().iter().map(|o| o.name()).collect()),
    ]
}

fn service_names(services: &[Service]) -> Vec<&str> {
    services.iter().map(|s| s.metadata.name.as_str()).collect()
}

fn summary(manifests: &ClassifiedManifests) -> serde_json::Value {
    buckets(manifests)
        .into_iter()
        .map(|(bucket, objects)| (bucket.to_string(), serde_json::json!(objects)))
        .collect::<serde_json::Map<_, _>>()
        .into()
}
