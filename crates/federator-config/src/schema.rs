// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema.
//!
//! ```yaml
//! runtime:
//!   idle_retry_ms: 5000
//! devices:
//!   - protocol: modbus_tcp
//!     device_id: plc-01
//!     host: 127.0.0.1
//!     port: 5020
//!     tags:
//!       - tag_id: reg0
//!         address: 0
//!         data_type: uint16
//! ```
//!
//! Device entries are kept as protocol-tagged [`DriverConfig`]s. Their
//! protocol-specific fields are checked by the driver factory that builds
//! them.

use std::collections::HashSet;
use std::time::Duration;

use federator_core::driver::DriverConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Host runtime settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Devices to poll.
    #[serde(default)]
    pub devices: Vec<DriverConfig>,
}

/// Host runtime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Wait between connect attempts while a device is not connected.
    #[serde(default = "default_idle_retry_ms")]
    pub idle_retry_ms: u64,
}

fn default_idle_retry_ms() -> u64 {
    5000
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            idle_retry_ms: default_idle_retry_ms(),
        }
    }
}

impl RuntimeConfig {
    /// Wait between connect attempts.
    pub fn idle_retry(&self) -> Duration {
        Duration::from_millis(self.idle_retry_ms)
    }
}

impl AppConfig {
    /// Validates structure shared by every protocol.
    ///
    /// Checks that each device has a non-empty, unique `device_id` and that
    /// runtime timings are positive.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.runtime.idle_retry_ms == 0 {
            return Err(ConfigError::validation(
                "runtime.idle_retry_ms",
                "must be greater than 0",
            ));
        }

        let mut seen = HashSet::with_capacity(self.devices.len());
        for (index, device) in self.devices.iter().enumerate() {
            let id = match device.device_id() {
                Some(id) if !id.trim().is_empty() => id,
                _ => {
                    return Err(ConfigError::validation(
                        format!("devices[{}].device_id", index),
                        "is required",
                    ))
                }
            };
            if !seen.insert(id) {
                return Err(ConfigError::duplicate_device(id));
            }
        }
        Ok(())
    }

    /// Total number of configured tags across all devices.
    pub fn tag_count(&self) -> usize {
        self.devices
            .iter()
            .filter_map(|d| d.settings.get("tags").and_then(|t| t.as_array()))
            .map(Vec::len)
            .sum()
    }
}
