// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Protocol driver abstraction layer.
//!
//! This module provides the contract every field-bus driver implements and
//! the factory registry the host uses to build drivers from configuration.
//!
//! # Design Principles
//!
//! - **Protocol Agnostic**: The host only ever sees [`ProtocolDriver`]
//! - **Async First**: All I/O operations are asynchronous and cancellable
//! - **Per-tag failures are data**: A failing tag yields a Bad [`TagValue`],
//!   never an error for the whole batch
//!
//! # Example
//!
//! ```rust,ignore
//! use federator_core::driver::{DriverRegistry, ProtocolDriver};
//! use tokio_util::sync::CancellationToken;
//!
//! let mut registry = DriverRegistry::new();
//! registry.register(Box::new(ModbusDriverFactory));
//!
//! let mut driver = registry.create(&driver_config)?;
//! let cancel = CancellationToken::new();
//! driver.connect(&cancel).await?;
//! let values = driver.read_tags(&driver.tag_ids(), &cancel).await?;
//! driver.close().await;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::error::DriverError;
use crate::types::{DeviceId, DriverState, Protocol, StateChange, TagId, TagValue};

// =============================================================================
// ProtocolDriver Trait
// =============================================================================

/// The core trait that all protocol drivers must implement.
///
/// # Thread Safety
///
/// Implementations are `Send + Sync`. Reads take `&self`, while
/// `connect` / `disconnect` / `close` need exclusive access. A driver is
/// owned by exactly one host task.
///
/// # Lifecycle
///
/// 1. Create the driver via a [`DriverFactory`]
/// 2. Call [`connect`](Self::connect)
/// 3. Call [`read_tags`](Self::read_tags) once per poll
/// 4. Call [`close`](Self::close) exactly once when done
#[async_trait]
pub trait ProtocolDriver: Send + Sync {
    // =========================================================================
    // Identification
    // =========================================================================

    /// Returns the device this driver talks to.
    fn device_id(&self) -> &DeviceId;

    /// Returns the protocol type this driver implements.
    fn protocol(&self) -> Protocol;

    // =========================================================================
    // Connection Management
    // =========================================================================

    /// Returns the current connection state.
    fn state(&self) -> DriverState;

    /// Subscribes to state transitions.
    ///
    /// Only transitions that change the state are published.
    fn subscribe_state(&self) -> broadcast::Receiver<StateChange>;

    /// Establishes a session with the device.
    ///
    /// A no-op when already connected. There is no internal retry; the host
    /// decides when to try again.
    ///
    /// # Errors
    ///
    /// - `DriverError::ConnectionFailed` / `DriverError::Timeout` - state is `Error`
    /// - `DriverError::Cancelled` - `cancel` fired, state is `Disconnected`
    async fn connect(&mut self, cancel: &CancellationToken) -> Result<(), DriverError>;

    /// Releases the session. Idempotent and infallible.
    async fn disconnect(&mut self);

    /// Returns `true` if currently connected.
    fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    // =========================================================================
    // Data Operations
    // =========================================================================

    /// Reads the given tags, one [`TagValue`] per requested id, in request order.
    ///
    /// # Errors
    ///
    /// - `DriverError::NotConnected` - no values are produced
    /// - `DriverError::Cancelled` - `cancel` fired mid-batch
    async fn read_tags(
        &self,
        tag_ids: &[TagId],
        cancel: &CancellationToken,
    ) -> Result<Vec<TagValue>, DriverError>;

    /// Returns the configured tag ids in configured order.
    fn tag_ids(&self) -> Vec<TagId>;

    /// Returns the delay the host waits between successful polls.
    fn polling_interval(&self) -> Duration;

    /// Tears the driver down. Attempts a graceful disconnect.
    async fn close(&mut self) {
        self.disconnect().await;
    }
}

// =============================================================================
// Driver Factory
// =============================================================================

/// Configuration for creating a driver instance.
///
/// The `protocol` field selects the factory; every other field is handed to
/// that factory untouched.
///
/// ```
/// use federator_core::driver::DriverConfig;
/// use federator_core::types::Protocol;
///
/// let config: DriverConfig = serde_json::from_str(
///     r#"{"protocol": "modbus_tcp", "device_id": "plc-01", "host": "10.0.0.5"}"#,
/// ).unwrap();
/// assert_eq!(config.protocol, Protocol::ModbusTcp);
/// assert_eq!(config.device_id(), Some("plc-01"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Protocol to use.
    pub protocol: Protocol,
    /// Protocol-specific settings.
    #[serde(flatten)]
    pub settings: serde_json::Map<String, serde_json::Value>,
}

impl DriverConfig {
    /// Creates a driver config from a protocol and its settings.
    pub fn new(protocol: Protocol, settings: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { protocol, settings }
    }

    /// Returns the `device_id` setting, if present and a string.
    pub fn device_id(&self) -> Option<&str> {
        self.settings.get("device_id").and_then(|v| v.as_str())
    }

    /// Deserializes the settings into a protocol-specific type.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidConfig` if the settings do not match `T`.
    pub fn parse_settings<T>(&self) -> Result<T, DriverError>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_value(serde_json::Value::Object(self.settings.clone())).map_err(|e| {
            DriverError::invalid_config(format!(
                "{} settings for '{}': {}",
                self.protocol,
                self.device_id().unwrap_or("<unnamed>"),
                e
            ))
        })
    }
}

/// A factory for creating protocol drivers.
///
/// Each protocol implementation provides a factory that builds driver
/// instances from configuration. Creation never touches the network.
pub trait DriverFactory: Send + Sync {
    /// Returns the protocol type this factory creates drivers for.
    fn protocol(&self) -> Protocol;

    /// Creates a new, disconnected driver instance.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidConfig` if the configuration is invalid.
    fn create(&self, config: &DriverConfig) -> Result<Box<dyn ProtocolDriver>, DriverError>;
}

// =============================================================================
// Driver Registry
// =============================================================================

/// A registry of driver factories keyed by protocol.
pub struct DriverRegistry {
    factories: HashMap<Protocol, Box<dyn DriverFactory>>,
}

impl DriverRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers a driver factory.
    ///
    /// If a factory for the same protocol already exists, it will be replaced.
    pub fn register(&mut self, factory: Box<dyn DriverFactory>) {
        let protocol = factory.protocol();
        self.factories.insert(protocol, factory);
        tracing::debug!(%protocol, "Registered driver factory");
    }

    /// Creates a driver from the given configuration.
    ///
    /// # Errors
    ///
    /// - `DriverError::Protocol` - No factory registered for the protocol
    /// - Other errors from the factory
    pub fn create(&self, config: &DriverConfig) -> Result<Box<dyn ProtocolDriver>, DriverError> {
        let factory = self.factories.get(&config.protocol).ok_or_else(|| {
            DriverError::protocol(format!("No factory registered for {}", config.protocol))
        })?;

        factory.create(config)
    }

    /// Returns the list of supported protocols.
    pub fn supported_protocols(&self) -> Vec<Protocol> {
        self.factories.keys().copied().collect()
    }

    /// Returns `true` if a factory is registered for the given protocol.
    pub fn supports(&self, protocol: Protocol) -> bool {
        self.factories.contains_key(&protocol)
    }

    /// Returns the number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if no factories are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("protocols", &self.supported_protocols())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
