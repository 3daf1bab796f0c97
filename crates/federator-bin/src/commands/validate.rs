// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};
use crate::runtime::HostRuntime;

/// Loads the configuration and builds every driver without connecting.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config_path = &cli.config;

    let config = federator_config::load_config(config_path)
        .map_err(|e| BinError::from(e).with_context("Configuration validation failed"))?;
    let device_count = config.devices.len();
    let tag_count = config.tag_count();

    let mut warnings: Vec<String> = Vec::new();
    if device_count == 0 {
        warnings.push("No devices configured".to_string());
    }

    // Protocol-specific fields are only checked when the driver is built.
    let tasks = HostRuntime::new(config).build_tasks()?;
    let devices: Vec<String> = tasks.iter().map(|t| t.device_id().to_string()).collect();

    match args.format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid: {}", config_path.display());
            println!();
            println!("Summary:");
            println!("  Devices: {}", device_count);
            println!("  Tags:    {}", tag_count);
            for device in &devices {
                println!("    - {}", device);
            }

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {}", warning);
                }
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "summary": {
                    "device_count": device_count,
                    "tag_count": tag_count,
                    "devices": devices,
                },
                "warnings": warnings,
            });
            let rendered = serde_json::to_string_pretty(&output)
                .map_err(|e| BinError::runtime(format!("Failed to render output: {}", e)))?;
            println!("{}", rendered);
        }
    }

    Ok(())
}
