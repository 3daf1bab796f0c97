// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `run` command.

use tracing::info;

use crate::cli::{Cli, RunArgs};
use crate::error::{BinError, BinResult};
use crate::runtime::HostRuntime;

/// Loads the configuration and polls every device until interrupted.
pub async fn run(cli: &Cli, args: RunArgs) -> BinResult<()> {
    info!("Starting federator v{}", crate::VERSION);

    let config = federator_config::load_config(&cli.config)
        .map_err(|e| BinError::from(e).with_context("Failed to load configuration"))?;

    let summaries = HostRuntime::new(config)
        .with_max_cycles(args.cycles)
        .run()
        .await?;

    for summary in &summaries {
        info!(
            device_id = %summary.device_id,
            cycles = summary.cycles,
            good = summary.good,
            bad = summary.bad,
            "Device summary"
        );
    }
    info!("Federator shutdown complete");
    Ok(())
}
