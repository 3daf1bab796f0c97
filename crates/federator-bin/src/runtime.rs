// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Host runtime.
//!
//! Builds one driver per configured device through the [`DriverRegistry`]
//! and runs each on its own tokio task:
//!
//! ```text
//!   ┌──────────┐  ok   ┌────────────┐       ┌──────────────────────┐
//!   │ connect  │──────▶│ read_tags  │──────▶│ sleep(polling)       │──┐
//!   └──────────┘       └────────────┘       └──────────────────────┘  │
//!        │ err                                                        │
//!        ▼                                                            │
//!   sleep(idle_retry) ◀───────────────────────────────────────────────┘
//! ```
//!
//! Every wait is raced against the shutdown token. On shutdown each task
//! closes its driver before returning.

use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use federator_config::AppConfig;
use federator_core::{
    DeviceId, DriverError, DriverRegistry, ProtocolDriver, StateChange, TagId, TagValue,
};
use federator_modbus::ModbusDriverFactory;

use crate::error::{BinError, BinResult};
use crate::shutdown::ShutdownCoordinator;

/// Returns a registry with every built-in protocol factory.
pub fn build_registry() -> DriverRegistry {
    let mut registry = DriverRegistry::new();
    registry.register(Box::new(ModbusDriverFactory::new()));
    registry
}

// =============================================================================
// DeviceSummary
// =============================================================================

/// Per-device counters reported when a device task ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    /// Device the counters belong to.
    pub device_id: DeviceId,
    /// Polling cycles attempted, including cycles spent failing to connect.
    pub cycles: u64,
    /// Good tag values returned.
    pub good: u64,
    /// Bad or uncertain tag values returned.
    pub bad: u64,
    /// Failed connect attempts.
    pub connect_failures: u64,
}

impl DeviceSummary {
    fn new(device_id: DeviceId) -> Self {
        Self {
            device_id,
            cycles: 0,
            good: 0,
            bad: 0,
            connect_failures: 0,
        }
    }

    fn record(&mut self, values: &[TagValue]) {
        let good = values.iter().filter(|v| v.is_good()).count() as u64;
        self.good += good;
        self.bad += values.len() as u64 - good;
    }
}

// =============================================================================
// DeviceTask
// =============================================================================

/// A driver and the timings its polling loop runs on.
pub struct DeviceTask {
    driver: Box<dyn ProtocolDriver>,
    polling_interval: Duration,
    idle_retry: Duration,
    max_cycles: Option<u64>,
}

impl DeviceTask {
    /// Creates a device task polling at the driver's configured interval.
    pub fn new(driver: Box<dyn ProtocolDriver>, idle_retry: Duration) -> Self {
        Self {
            polling_interval: driver.polling_interval(),
            driver,
            idle_retry,
            max_cycles: None,
        }
    }

    /// Stops the loop after `max_cycles` cycles.
    pub fn with_max_cycles(mut self, max_cycles: Option<u64>) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    /// Device this task polls.
    pub fn device_id(&self) -> &DeviceId {
        self.driver.device_id()
    }

    /// Runs the polling loop until `cancel` fires or the cycle limit is hit,
    /// then closes the driver.
    pub async fn run(mut self, cancel: CancellationToken) -> DeviceSummary {
        let device_id = self.driver.device_id().clone();
        let tag_ids = self.driver.tag_ids();
        let state_log = spawn_state_logger(self.driver.subscribe_state());
        let mut summary = DeviceSummary::new(device_id.clone());

        info!(
            device_id = %device_id,
            protocol = %self.driver.protocol(),
            tags = tag_ids.len(),
            interval_ms = self.polling_interval.as_millis() as u64,
            "Device task started"
        );

        loop {
            if self.max_cycles.is_some_and(|max| summary.cycles >= max) {
                break;
            }

            let Some(wait) = self.poll_once(&tag_ids, &cancel, &mut summary).await else {
                break;
            };
            summary.cycles += 1;

            if self.max_cycles.is_some_and(|max| summary.cycles >= max) {
                break;
            }
            if !sleep_or_cancel(&cancel, wait).await {
                break;
            }
        }

        self.driver.close().await;
        drop(self);
        // The logger drains once the driver's state channel closes.
        let _ = state_log.await;

        info!(
            device_id = %summary.device_id,
            cycles = summary.cycles,
            good = summary.good,
            bad = summary.bad,
            connect_failures = summary.connect_failures,
            "Device task stopped"
        );
        summary
    }

    /// One cycle. Returns how long to wait before the next one, or `None`
    /// once cancelled or after a connect error that retrying cannot fix.
    async fn poll_once(
        &mut self,
        tag_ids: &[TagId],
        cancel: &CancellationToken,
        summary: &mut DeviceSummary,
    ) -> Option<Duration> {
        if !self.driver.is_connected() {
            match self.driver.connect(cancel).await {
                Ok(()) => {}
                Err(DriverError::Cancelled) => return None,
                Err(e) if e.is_retryable() => {
                    summary.connect_failures += 1;
                    warn!(
                        device_id = %summary.device_id,
                        error = %e,
                        error_type = e.error_type(),
                        retry_ms = self.idle_retry.as_millis() as u64,
                        "Connect failed"
                    );
                    return Some(self.idle_retry);
                }
                Err(e) => {
                    summary.connect_failures += 1;
                    error!(
                        device_id = %summary.device_id,
                        error = %e,
                        error_type = e.error_type(),
                        "Connect failed, giving up on device"
                    );
                    return None;
                }
            }
        }

        match self.driver.read_tags(tag_ids, cancel).await {
            Ok(values) => {
                summary.record(&values);
                log_values(&summary.device_id, &values);
                Some(self.polling_interval)
            }
            Err(DriverError::Cancelled) => None,
            Err(e) => {
                warn!(
                    device_id = %summary.device_id,
                    error = %e,
                    error_type = e.error_type(),
                    "Poll failed"
                );
                Some(self.idle_retry)
            }
        }
    }
}

fn log_values(device_id: &DeviceId, values: &[TagValue]) {
    for value in values {
        if value.is_good() {
            info!(device_id = %device_id, tag_id = %value.tag_id, "{}", value);
        } else {
            warn!(device_id = %device_id, tag_id = %value.tag_id, "{}", value);
        }
    }
}

/// Sleeps for `duration`. Returns `false` if cancelled first.
async fn sleep_or_cancel(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

fn spawn_state_logger(mut rx: broadcast::Receiver<StateChange>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(change) => info!(
                    device_id = %change.device_id,
                    previous = %change.previous,
                    current = %change.current,
                    "Driver state changed"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "State change logger lagged")
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

// =============================================================================
// HostRuntime
// =============================================================================

/// Runs every configured device until shutdown.
pub struct HostRuntime {
    config: AppConfig,
    registry: DriverRegistry,
    shutdown: ShutdownCoordinator,
    max_cycles: Option<u64>,
}

impl HostRuntime {
    /// Creates a runtime with the built-in protocol factories.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            registry: build_registry(),
            shutdown: ShutdownCoordinator::new(),
            max_cycles: None,
        }
    }

    /// Replaces the driver registry.
    pub fn with_registry(mut self, registry: DriverRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Stops each device after `max_cycles` polling cycles.
    pub fn with_max_cycles(mut self, max_cycles: Option<u64>) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    /// Returns a handle that can stop the runtime.
    pub fn shutdown_handle(&self) -> ShutdownCoordinator {
        self.shutdown.clone()
    }

    /// Builds one task per device. Fails on the first device whose driver
    /// cannot be created.
    pub fn build_tasks(&self) -> BinResult<Vec<DeviceTask>> {
        let idle_retry = self.config.runtime.idle_retry();

        self.config
            .devices
            .iter()
            .map(|device| {
                let driver = self.registry.create(device).map_err(|e| {
                    BinError::from(e).with_context(format!(
                        "device '{}'",
                        device.device_id().unwrap_or("<unnamed>")
                    ))
                })?;
                Ok(DeviceTask::new(driver, idle_retry).with_max_cycles(self.max_cycles))
            })
            .collect()
    }

    /// Runs until a shutdown signal arrives or every device task finishes.
    pub async fn run(self) -> BinResult<Vec<DeviceSummary>> {
        let tasks = self.build_tasks()?;
        if tasks.is_empty() {
            warn!("No devices configured");
            return Ok(Vec::new());
        }

        info!(devices = tasks.len(), "Starting device tasks");

        let mut set = JoinSet::new();
        for task in tasks {
            debug!(device_id = %task.device_id(), "Spawning device task");
            set.spawn(task.run(self.shutdown.child_token()));
        }

        let watcher = {
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move { shutdown.wait_for_shutdown().await })
        };

        let mut summaries = Vec::new();
        let mut failed = 0usize;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    failed += 1;
                    error!("Device task failed: {}", e);
                }
            }
        }
        watcher.abort();

        info!(devices = summaries.len(), "All device tasks stopped");

        if failed > 0 {
            return Err(BinError::runtime(format!("{} device task(s) panicked", failed)));
        }
        summaries.sort_by(|a, b| a.device_id.as_str().cmp(b.device_id.as_str()));
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use federator_core::{DriverConfig, Protocol};

    fn entry(json: serde_json::Value) -> DriverConfig {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_build_registry() {
        let registry = build_registry();
        assert!(registry.supports(Protocol::ModbusTcp));
    }

    #[test]
    fn test_build_tasks_reports_device() {
        let config = AppConfig {
            devices: vec![entry(serde_json::json!({
                "protocol": "modbus_tcp", "device_id": "broken", "host": "localhost", "port": 0
            }))],
            ..Default::default()
        };
        let err = HostRuntime::new(config).build_tasks().err().unwrap();
        assert!(err.to_string().contains("device 'broken'"));
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_sleep_or_cancel() {
        let cancel = CancellationToken::new();
        assert!(sleep_or_cancel(&cancel, Duration::from_millis(1)).await);
        cancel.cancel();
        assert!(!sleep_or_cancel(&cancel, Duration::from_secs(60)).await);
    }
}
