// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus protocol driver implementation.
//!
//! [`ModbusDriver`] owns one transport, tracks the connection state machine
//! and turns configured tags into [`TagValue`]s.
//!
//! ```text
//!              connect                  success
//! Disconnected ───────▶ Connecting ───────────────▶ Connected
//!      ▲                    │  │ failure                 │
//!      │        cancelled   │  └─────────▶ Error          │
//!      └────────────────────┘                            │
//!      ▲                      disconnect (from any)      │
//!      └─────────────────────────────────────────────────┘
//! ```
//!
//! Per-tag failures are data. They produce Bad readings and never move the
//! state machine.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use federator_core::driver::{DriverConfig, DriverFactory, ProtocolDriver};
use federator_core::error::{DriverError, TagReadError};
use federator_core::state::StateNotifier;
use federator_core::types::{DeviceId, DriverState, Protocol, StateChange, TagId, TagValue, Value};

use crate::client::{ModbusTcpTransport, ModbusTransport};
use crate::codec::{self, DecodeError};
use crate::error::ModbusResult;
use crate::types::{ModbusDataType, ModbusDeviceConfig, ModbusTagConfig, RegisterType};

/// Modbus TCP driver over `tokio-modbus`.
pub type ModbusTcpDriver = ModbusDriver<ModbusTcpTransport>;

// =============================================================================
// ModbusDriver
// =============================================================================

/// Modbus protocol driver implementing `federator_core::ProtocolDriver`.
///
/// # Example
///
/// ```rust,ignore
/// use federator_modbus::driver::ModbusTcpDriver;
/// use federator_modbus::types::ModbusDeviceConfig;
/// use tokio_util::sync::CancellationToken;
///
/// let mut driver = ModbusTcpDriver::from_config(ModbusDeviceConfig::new("plc-01", "10.0.0.5"))?;
/// let cancel = CancellationToken::new();
/// driver.connect(&cancel).await?;
/// let values = driver.read_tags(&driver.tag_ids(), &cancel).await?;
/// driver.close().await;
/// ```
pub struct ModbusDriver<T: ModbusTransport> {
    config: ModbusDeviceConfig,
    transport: T,
    state: StateNotifier,
    tag_index: HashMap<TagId, usize>,
}

impl ModbusTcpDriver {
    /// Creates a TCP driver from a device configuration.
    ///
    /// Nothing touches the network until [`ProtocolDriver::connect`].
    pub fn from_config(config: ModbusDeviceConfig) -> ModbusResult<Self> {
        let transport = ModbusTcpTransport::new(&config);
        Self::with_transport(config, transport)
    }
}

impl<T: ModbusTransport> ModbusDriver<T> {
    /// Creates a driver over an arbitrary transport.
    pub fn with_transport(config: ModbusDeviceConfig, transport: T) -> ModbusResult<Self> {
        config.validate()?;

        let tag_index = config
            .tags
            .iter()
            .enumerate()
            .map(|(i, tag)| (tag.tag_id.clone(), i))
            .collect();

        Ok(Self {
            state: StateNotifier::new(config.device_id.clone()),
            config,
            transport,
            tag_index,
        })
    }

    /// Returns the device configuration.
    pub fn config(&self) -> &ModbusDeviceConfig {
        &self.config
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Looks up a configured tag.
    pub fn tag(&self, tag_id: &TagId) -> Option<&ModbusTagConfig> {
        self.tag_index.get(tag_id).map(|&i| &self.config.tags[i])
    }

    /// Reads and decodes a single tag.
    ///
    /// This is the per-tag result a batch read is built from. Failures are
    /// logged and returned, never propagated as a driver error.
    pub async fn read_tag(&self, tag: &ModbusTagConfig) -> Result<Value, TagReadError> {
        self.read_value(tag).await.map_err(|e| {
            e.log(self.config.device_id.as_str(), tag.tag_id.as_str());
            e.into_tag_error()
        })
    }

    async fn read_value(&self, tag: &ModbusTagConfig) -> ModbusResult<Value> {
        if tag.register_type.is_word() && tag.data_type == ModbusDataType::Bool {
            return Err(DecodeError::UnsupportedEncoding {
                data_type: tag.data_type,
                register_type: tag.register_type,
            }
            .into());
        }

        let count = tag.read_count();
        let value = match tag.register_type {
            RegisterType::Coil => {
                let bits = self.transport.read_coils(tag.address, count).await?;
                Value::Bool(codec::decode_bits(&bits, tag)?)
            }
            RegisterType::DiscreteInput => {
                let bits = self.transport.read_discrete_inputs(tag.address, count).await?;
                Value::Bool(codec::decode_bits(&bits, tag)?)
            }
            RegisterType::HoldingRegister => {
                let words = self.transport.read_holding_registers(tag.address, count).await?;
                Value::Float(codec::decode_registers(&words, tag)?)
            }
            RegisterType::InputRegister => {
                let words = self.transport.read_input_registers(tag.address, count).await?;
                Value::Float(codec::decode_registers(&words, tag)?)
            }
        };
        Ok(value)
    }

    async fn read_one(&self, tag_id: &TagId) -> TagValue {
        match self.tag(tag_id) {
            None => TagValue::bad(tag_id.clone(), TagReadError::not_found(tag_id.as_str())),
            Some(tag) => match self.read_tag(tag).await {
                Ok(value) => TagValue::good(tag_id.clone(), value),
                Err(error) => TagValue::bad(tag_id.clone(), error),
            },
        }
    }

    async fn release_transport(&mut self) {
        if let Err(e) = self.transport.disconnect().await {
            tracing::warn!(
                device_id = %self.config.device_id,
                error = %e,
                "Error releasing Modbus transport"
            );
        }
    }
}

#[async_trait]
impl<T: ModbusTransport + 'static> ProtocolDriver for ModbusDriver<T> {
    fn device_id(&self) -> &DeviceId {
        &self.config.device_id
    }

    fn protocol(&self) -> Protocol {
        Protocol::ModbusTcp
    }

    fn state(&self) -> DriverState {
        self.state.get()
    }

    fn subscribe_state(&self) -> broadcast::Receiver<StateChange> {
        self.state.subscribe()
    }

    async fn connect(&mut self, cancel: &CancellationToken) -> Result<(), DriverError> {
        if self.state.get().is_connected() {
            return Ok(());
        }

        self.state.set(DriverState::Connecting);
        tracing::info!(
            device_id = %self.config.device_id,
            target = %self.transport.display_name(),
            "Connecting to Modbus device"
        );

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.transport.connect() => Some(result),
        };

        match outcome {
            Some(Ok(())) => {
                self.state.set(DriverState::Connected);
                tracing::info!(
                    device_id = %self.config.device_id,
                    tags = self.config.tags.len(),
                    "Modbus driver connected"
                );
                Ok(())
            }
            Some(Err(e)) => {
                e.log(self.config.device_id.as_str(), "connect");
                self.release_transport().await;
                self.state.set(DriverState::Error);
                Err(e.into())
            }
            None => {
                self.release_transport().await;
                self.state.set(DriverState::Disconnected);
                tracing::info!(device_id = %self.config.device_id, "Connect cancelled");
                Err(DriverError::Cancelled)
            }
        }
    }

    async fn disconnect(&mut self) {
        self.release_transport().await;
        if self.state.set(DriverState::Disconnected) {
            tracing::info!(device_id = %self.config.device_id, "Modbus driver disconnected");
        }
    }

    async fn read_tags(
        &self,
        tag_ids: &[TagId],
        cancel: &CancellationToken,
    ) -> Result<Vec<TagValue>, DriverError> {
        if !self.state.get().is_connected() {
            return Err(DriverError::NotConnected);
        }

        let mut values = Vec::with_capacity(tag_ids.len());
        for tag_id in tag_ids {
            // Dropping the read here leaves its request unanswered. The
            // transport replaces the session before its next request.
            let value = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DriverError::Cancelled),
                value = self.read_one(tag_id) => value,
            };
            values.push(value);
        }

        tracing::debug!(
            device_id = %self.config.device_id,
            requested = tag_ids.len(),
            good = values.iter().filter(|v| v.is_good()).count(),
            "Read tags"
        );
        Ok(values)
    }

    fn tag_ids(&self) -> Vec<TagId> {
        self.config.tags.iter().map(|t| t.tag_id.clone()).collect()
    }

    fn polling_interval(&self) -> Duration {
        self.config.polling_interval()
    }

    async fn close(&mut self) {
        self.disconnect().await;
        tracing::debug!(device_id = %self.config.device_id, "Modbus driver closed");
    }
}

impl<T: ModbusTransport> fmt::Debug for ModbusDriver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModbusDriver")
            .field("device_id", &self.config.device_id)
            .field("target", &self.transport.display_name())
            .field("state", &self.state.get())
            .finish()
    }
}

// =============================================================================
// ModbusDriverFactory
// =============================================================================

/// Factory for creating Modbus TCP drivers.
#[derive(Debug, Default)]
pub struct ModbusDriverFactory;

impl ModbusDriverFactory {
    /// Creates a new factory.
    pub fn new() -> Self {
        Self
    }
}

impl DriverFactory for ModbusDriverFactory {
    fn protocol(&self) -> Protocol {
        Protocol::ModbusTcp
    }

    fn create(&self, config: &DriverConfig) -> Result<Box<dyn ProtocolDriver>, DriverError> {
        let device: ModbusDeviceConfig = config.parse_settings()?;
        let driver = ModbusTcpDriver::from_config(device)?;
        Ok(Box::new(driver))
    }
}

// =============================================================================
// Tests
// =============================================================================
