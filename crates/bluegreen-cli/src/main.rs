use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "bluegreen",
    about = "Blue/green rollouts for Kubernetes manifests",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to bluegreen.toml (default: ./bluegreen.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how manifests are bucketed for a rollout
    Classify {
        /// Manifest files or directories
        #[arg(short = 'f', long = "filename", required = true)]
        filenames: Vec<PathBuf>,
        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Deploy green workloads, then route traffic to them
    Deploy(RolloutArgs),
    /// Route traffic to already deployed green workloads
    Route(RolloutArgs),
    /// Route traffic back to the stable workloads
    Restore(RolloutArgs),
    /// Write a bluegreen.toml scaffold
    Init {
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
        #[arg(short, long, default_value = "default")]
        namespace: String,
        #[arg(short, long, default_value = "service")]
        strategy: String,
    },
}

#[derive(Args)]
pub struct RolloutArgs {
    /// Manifest files or directories
    #[arg(short = 'f', long = "filename", required = true)]
    pub filenames: Vec<PathBuf>,
    /// Route strategy: ingress, smi or service.
    /// Overrides [rollout].strategy in bluegreen.toml.
    #[arg(short, long)]
    pub strategy: Option<String>,
    /// Passed verbatim to every kubectl apply, e.g. 240s
    #[arg(short, long)]
    pub timeout: Option<String>,
    #[arg(short, long)]
    pub namespace: Option<String>,
    /// Output format: text or json
    #[arg(long, default_value = "text")]
    pub format: String,
}

fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,bluegreen=debug"))?;
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json)?;

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Classify { filenames, format } => commands::classify::classify(&filenames, &format),
        Commands::Deploy(args) => commands::deploy::deploy(&config, &args).await,
        Commands::Route(args) => commands::route::route(&config, &args).await,
        Commands::Restore(args) => commands::route::restore(&config, &args).await,
        Commands::Init {
            path,
            namespace,
            strategy,
        } => commands::init(&path, &namespace, &strategy),
    }
}
