// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # federator-config
//!
//! Configuration loading and validation for federator.
//!
//! - **Schema**: `AppConfig` with runtime settings and protocol-tagged devices
//! - **Loader**: YAML / JSON by extension, `${VAR:default}` substitution
//! - **Error**: `ConfigError`

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, ConfigFormat, ConfigLoader};
pub use schema::{AppConfig, RuntimeConfig};
