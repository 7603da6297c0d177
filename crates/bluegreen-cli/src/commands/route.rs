use tracing::info;

use bluegreen_core::BlueGreenConfig;

use super::{print_result, Rollout};
use crate::RolloutArgs;

/// Run the `bluegreen route` command: cut traffic over to green.
pub async fn route(config: &BlueGreenConfig, args: &RolloutArgs) -> anyhow::Result<()> {
    let rollout = Rollout::resolve(config, args)?;
    info!(strategy = %rollout.strategy, "routing to green");

    let result = rollout
        .controller
        .route_blue_green_for_deploy(&rollout.manifests, rollout.strategy, rollout.timeout.as_deref())
        .await?;

    print_result(&result, &args.format)
}

/// Run the `bluegreen restore` command: send traffic back to stable.
pub async fn restore(config: &BlueGreenConfig, args: &RolloutArgs) -> anyhow::Result<()> {
    let rollout = Rollout::resolve(config, args)?;
    info!(strategy = %rollout.strategy, "restoring stable routing");

    let result = rollout
        .controller
        .route_blue_green_to_stable(&rollout.manifests, rollout.strategy, rollout.timeout.as_deref())
        .await?;

    print_result(&result, &args.format)
}
