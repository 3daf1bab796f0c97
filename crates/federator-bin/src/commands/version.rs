// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

use crate::cli::Cli;
use crate::error::BinResult;
use crate::runtime::build_registry;

/// Prints version and supported protocol information.
pub fn version(_cli: &Cli) -> BinResult<()> {
    let protocols: Vec<String> = build_registry()
        .supported_protocols()
        .iter()
        .map(|p| p.to_string())
        .collect();

    println!("Federator - field-bus tag reader");
    println!();
    println!("Version Information:");
    println!("  federator-bin:  {}", crate::VERSION);
    println!("  federator-core: {}", federator_core::VERSION);
    println!();
    println!("Build Information:");
    println!("  Target: {}", std::env::consts::ARCH);
    println!("  OS:     {}", std::env::consts::OS);
    println!();
    println!("Protocols: {}", protocols.join(", "));
    println!();
    println!("License: PolyForm Noncommercial License 1.0.0");
    println!("Copyright (c) 2025 Sylvex. All rights reserved.");

    Ok(())
}
