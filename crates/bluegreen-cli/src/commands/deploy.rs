use tracing::info;

use bluegreen_core::BlueGreenConfig;

use super::{print_result, Rollout};
use crate::RolloutArgs;

/// Run the `bluegreen deploy` command.
pub async fn deploy(config: &BlueGreenConfig, args: &RolloutArgs) -> anyhow::Result<()> {
    let rollout = Rollout::resolve(config, args)?;
    info!(
        strategy = %rollout.strategy,
        files = rollout.manifests.len(),
        timeout = ?rollout.timeout,
        "deploying"
    );

    let result = rollout
        .controller
        .deploy_blue_green(&rollout.manifests, rollout.strategy, rollout.timeout.as_deref())
        .await?;

    print_result(&result, &args.format)
}
