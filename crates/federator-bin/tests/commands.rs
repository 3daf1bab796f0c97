// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Command Tests

use std::io::Write;

use clap::Parser;
use federator_bin::cli::{Cli, Commands, ValidateArgs};
use federator_bin::commands;
use tempfile::{Builder, NamedTempFile};

fn write_config(content: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn cli_for(file: &NamedTempFile, format: &str) -> (Cli, ValidateArgs) {
    let path = file.path().to_str().unwrap();
    let cli = Cli::parse_from(["federator", "validate", "-c", path, "-f", format]);
    let args = match cli.effective_command() {
        Commands::Validate(args) => args,
        other => panic!("Expected Validate command, got {:?}", other),
    };
    (cli, args)
}

#[test]
fn test_validate_accepts_modbus_device() {
    let file = write_config(
        r#"
devices:
  - protocol: modbus_tcp
    device_id: plc-01
    host: 127.0.0.1
    port: 5020
    tags:
      - tag_id: reg0
        register_type: holding_register
        address: 0
        data_type: uint16
"#,
    );
    let (cli, args) = cli_for(&file, "text");
    commands::validate(&cli, args).unwrap();

    let (cli, args) = cli_for(&file, "json");
    commands::validate(&cli, args).unwrap();
}

#[test]
fn test_validate_rejects_bad_device_settings() {
    let file = write_config(
        r#"
devices:
  - protocol: modbus_tcp
    device_id: plc-01
    host: 127.0.0.1
    tags:
      - {tag_id: dup, address: 0}
      - {tag_id: dup, address: 1}
"#,
    );
    let (cli, args) = cli_for(&file, "text");
    let err = commands::validate(&cli, args).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("plc-01"));
}

#[test]
fn test_validate_missing_file() {
    let cli = Cli::parse_from(["federator", "validate", "-c", "/nonexistent/federator.yaml"]);
    let err = commands::validate(&cli, ValidateArgs::default()).unwrap_err();
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_version() {
    let cli = Cli::parse_from(["federator", "version"]);
    commands::version(&cli).unwrap();
}
