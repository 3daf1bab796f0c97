// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus-specific types and configuration.
//!
//! - **RegisterType**: The four Modbus data categories and their read function codes
//! - **ModbusDataType**: How a tag's registers are interpreted
//! - **ByteOrder**: Multi-register layout for 32-bit and 64-bit values
//! - **ModbusTagConfig**: One configured tag
//! - **ModbusDeviceConfig**: One device and its tags
//!
//! # Examples
//!
//! ```
//! use federator_modbus::types::{
//!     ModbusDataType, ModbusDeviceConfig, ModbusTagConfig, RegisterType,
//! };
//!
//! let config = ModbusDeviceConfig::new("plc-01", "192.168.1.100")
//!     .with_port(5020)
//!     .with_tag(
//!         ModbusTagConfig::new("flow", RegisterType::InputRegister, 10, ModbusDataType::Float32)
//!             .with_scale(0.1, 0.0),
//!     );
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.socket_addr(), "192.168.1.100:5020");
//! ```

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use federator_core::types::{DeviceId, TagId};
use serde::{Deserialize, Serialize};

use crate::error::ModbusError;

// =============================================================================
// RegisterType
// =============================================================================

/// Modbus data category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterType {
    /// Coil (read/write, 1 bit).
    ///
    /// - Function code 1: Read Coils
    #[serde(alias = "Coil")]
    Coil,

    /// Discrete Input (read-only, 1 bit).
    ///
    /// - Function code 2: Read Discrete Inputs
    #[serde(alias = "DiscreteInput")]
    DiscreteInput,

    /// Holding Register (read/write, 16 bits).
    ///
    /// - Function code 3: Read Holding Registers
    #[default]
    #[serde(alias = "HoldingRegister")]
    HoldingRegister,

    /// Input Register (read-only, 16 bits).
    ///
    /// - Function code 4: Read Input Registers
    #[serde(alias = "InputRegister")]
    InputRegister,
}

impl RegisterType {
    /// Returns `true` if this is a bit-type register (1-bit).
    #[inline]
    pub const fn is_bit(&self) -> bool {
        matches!(self, Self::Coil | Self::DiscreteInput)
    }

    /// Returns `true` if this is a word-type register (16-bit).
    #[inline]
    pub const fn is_word(&self) -> bool {
        matches!(self, Self::HoldingRegister | Self::InputRegister)
    }

    /// Returns the function code for reading this register type.
    #[inline]
    pub const fn read_function_code(&self) -> u8 {
        match self {
            Self::Coil => 0x01,
            Self::DiscreteInput => 0x02,
            Self::HoldingRegister => 0x03,
            Self::InputRegister => 0x04,
        }
    }

    /// Returns the short name for this register type.
    pub const fn short_name(&self) -> &'static str {
        match self {
            Self::Coil => "C",
            Self::DiscreteInput => "DI",
            Self::InputRegister => "IR",
            Self::HoldingRegister => "HR",
        }
    }
}

impl fmt::Display for RegisterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

// =============================================================================
// ModbusDataType
// =============================================================================

/// How a tag's registers are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModbusDataType {
    /// Boolean, only meaningful for coils and discrete inputs.
    #[serde(alias = "Bool", alias = "Boolean")]
    Bool,
    /// 16-bit signed integer (1 register).
    #[default]
    #[serde(alias = "Int16")]
    Int16,
    /// 16-bit unsigned integer (1 register).
    #[serde(alias = "UInt16")]
    UInt16,
    /// 32-bit signed integer (2 registers).
    #[serde(alias = "Int32")]
    Int32,
    /// 32-bit unsigned integer (2 registers).
    #[serde(alias = "UInt32")]
    UInt32,
    /// 32-bit IEEE 754 float (2 registers).
    #[serde(alias = "Float32", alias = "Float")]
    Float32,
    /// 64-bit IEEE 754 float (4 registers).
    #[serde(alias = "Float64", alias = "Double")]
    Float64,
}

impl ModbusDataType {
    /// Returns the number of registers required for this data type.
    #[inline]
    pub const fn register_count(&self) -> u16 {
        match self {
            Self::Bool | Self::Int16 | Self::UInt16 => 1,
            Self::Int32 | Self::UInt32 | Self::Float32 => 2,
            Self::Float64 => 4,
        }
    }

    /// Returns `true` if this is a signed integer type.
    #[inline]
    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::Int16 | Self::Int32)
    }

    /// Returns `true` if this is a floating-point type.
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Byte order used when a tag does not override it.
    pub const fn default_byte_order(&self) -> ByteOrder {
        match self {
            Self::Float64 => ByteOrder::LegacySwapped,
            _ => ByteOrder::BigEndian,
        }
    }

    /// Returns the configuration name of this data type.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int16 => "int16",
            Self::UInt16 => "uint16",
            Self::Int32 => "int32",
            Self::UInt32 => "uint32",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }
}

impl fmt::Display for ModbusDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// ByteOrder
// =============================================================================

/// Layout of a multi-register value.
///
/// Letters name the bytes of the value from most to least significant, in
/// the order they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// ABCD. Most significant word first, high byte first.
    #[serde(alias = "abcd", alias = "ABCD")]
    BigEndian,

    /// DCBA. Least significant word first, low byte first.
    #[serde(alias = "dcba", alias = "DCBA")]
    LittleEndian,

    /// CDAB. Least significant word first, high byte first (word swap).
    #[serde(alias = "cdab", alias = "CDAB")]
    MidBigEndian,

    /// BADC. Most significant word first, low byte first (byte swap).
    #[serde(alias = "badc", alias = "BADC")]
    MidLittleEndian,

    /// Each word high byte first, words in wire order, and the resulting
    /// bytes read as a little-endian number. Default for `float64`.
    LegacySwapped,
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BigEndian => "big_endian",
            Self::LittleEndian => "little_endian",
            Self::MidBigEndian => "mid_big_endian",
            Self::MidLittleEndian => "mid_little_endian",
            Self::LegacySwapped => "legacy_swapped",
        };
        f.write_str(s)
    }
}

// =============================================================================
// ModbusTagConfig
// =============================================================================

/// One configured tag: where it lives and how to decode it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModbusTagConfig {
    /// Tag identifier, unique within the device.
    pub tag_id: TagId,

    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Data category to read from.
    #[serde(default)]
    pub register_type: RegisterType,

    /// Zero-based starting address.
    pub address: u16,

    /// How to interpret the registers.
    #[serde(default)]
    pub data_type: ModbusDataType,

    /// Multiplier applied to the raw numeric value.
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Added after scaling.
    #[serde(default)]
    pub offset: f64,

    /// Overrides the data type's default multi-register layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_order: Option<ByteOrder>,
}

fn default_scale() -> f64 {
    1.0
}

impl ModbusTagConfig {
    /// Creates a tag with unit scale and no offset.
    pub fn new(
        tag_id: impl Into<TagId>,
        register_type: RegisterType,
        address: u16,
        data_type: ModbusDataType,
    ) -> Self {
        Self {
            tag_id: tag_id.into(),
            name: None,
            register_type,
            address,
            data_type,
            scale: default_scale(),
            offset: 0.0,
            byte_order: None,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets scale and offset.
    pub fn with_scale(mut self, scale: f64, offset: f64) -> Self {
        self.scale = scale;
        self.offset = offset;
        self
    }

    /// Overrides the byte order.
    pub fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = Some(order);
        self
    }

    /// Number of units to request on the wire.
    ///
    /// Bit categories always read a single bit.
    pub fn read_count(&self) -> u16 {
        if self.register_type.is_bit() {
            1
        } else {
            self.data_type.register_count()
        }
    }

    /// Byte order in effect for this tag.
    pub fn effective_byte_order(&self) -> ByteOrder {
        self.byte_order
            .unwrap_or_else(|| self.data_type.default_byte_order())
    }

    /// Validates this tag.
    pub fn validate(&self) -> Result<(), ModbusError> {
        if self.tag_id.as_str().is_empty() {
            return Err(ModbusError::configuration("tag_id", "must not be empty"));
        }
        if !self.scale.is_finite() || !self.offset.is_finite() {
            return Err(ModbusError::configuration(
                format!("tags.{}.scale", self.tag_id),
                "scale and offset must be finite",
            ));
        }
        let last = u32::from(self.address) + u32::from(self.read_count()) - 1;
        if last > u32::from(u16::MAX) {
            return Err(ModbusError::configuration(
                format!("tags.{}.address", self.tag_id),
                format!(
                    "{} at {} needs {} registers past the end of the address space",
                    self.data_type,
                    self.address,
                    self.read_count()
                ),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// ModbusDeviceConfig
// =============================================================================

/// Configuration for one Modbus TCP device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModbusDeviceConfig {
    /// Unique device identifier.
    pub device_id: DeviceId,

    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Target host name or address.
    pub host: String,

    /// Target port (default: 502).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Unit ID / slave address (default: 1).
    #[serde(default = "default_unit_id")]
    pub unit_id: u8,

    /// Connect deadline in milliseconds (default: 5000).
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// Per-request deadline in milliseconds (default: 1000).
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Delay between polls in milliseconds (default: 1000).
    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,

    /// Configured tags, in polling order.
    #[serde(default)]
    pub tags: Vec<ModbusTagConfig>,
}

fn default_port() -> u16 {
    502
}

fn default_unit_id() -> u8 {
    1
}

fn default_connection_timeout_ms() -> u64 {
    5000
}

fn default_read_timeout_ms() -> u64 {
    1000
}

fn default_polling_interval_ms() -> u64 {
    1000
}

impl ModbusDeviceConfig {
    /// Creates a configuration with default port, unit and timings.
    pub fn new(device_id: impl Into<DeviceId>, host: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            name: None,
            host: host.into(),
            port: default_port(),
            unit_id: default_unit_id(),
            connection_timeout_ms: default_connection_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            polling_interval_ms: default_polling_interval_ms(),
            tags: Vec::new(),
        }
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the unit ID.
    pub fn with_unit_id(mut self, unit_id: u8) -> Self {
        self.unit_id = unit_id;
        self
    }

    /// Sets connect and read deadlines.
    pub fn with_timeouts(mut self, connection_timeout_ms: u64, read_timeout_ms: u64) -> Self {
        self.connection_timeout_ms = connection_timeout_ms;
        self.read_timeout_ms = read_timeout_ms;
        self
    }

    /// Sets the poll interval.
    pub fn with_polling_interval(mut self, polling_interval_ms: u64) -> Self {
        self.polling_interval_ms = polling_interval_ms;
        self
    }

    /// Appends a tag.
    pub fn with_tag(mut self, tag: ModbusTagConfig) -> Self {
        self.tags.push(tag);
        self
    }

    /// Returns the `host:port` string.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the display name, falling back to the device id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.device_id.as_str())
    }

    /// Connect deadline.
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    /// Per-request deadline.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Delay between polls.
    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }

    /// Looks up a tag by id.
    pub fn tag(&self, tag_id: &TagId) -> Option<&ModbusTagConfig> {
        self.tags.iter().find(|t| &t.tag_id == tag_id)
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), ModbusError> {
        if self.device_id.as_str().is_empty() {
            return Err(ModbusError::configuration("device_id", "must not be empty"));
        }
        if self.host.trim().is_empty() {
            return Err(ModbusError::configuration("host", "must not be empty"));
        }
        if self.port == 0 {
            return Err(ModbusError::configuration("port", "must not be 0"));
        }
        if self.connection_timeout_ms == 0 {
            return Err(ModbusError::configuration(
                "connection_timeout_ms",
                "must be greater than 0",
            ));
        }
        if self.read_timeout_ms == 0 {
            return Err(ModbusError::configuration(
                "read_timeout_ms",
                "must be greater than 0",
            ));
        }
        if self.polling_interval_ms == 0 {
            return Err(ModbusError::configuration(
                "polling_interval_ms",
                "must be greater than 0",
            ));
        }

        let mut seen = HashSet::with_capacity(self.tags.len());
        for tag in &self.tags {
            tag.validate()?;
            if !seen.insert(&tag.tag_id) {
                return Err(ModbusError::configuration(
                    "tags",
                    format!("duplicate tag_id '{}'", tag.tag_id),
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_type_function_codes() {
        assert_eq!(RegisterType::Coil.read_function_code(), 0x01);
        assert_eq!(RegisterType::DiscreteInput.read_function_code(), 0x02);
        assert_eq!(RegisterType::HoldingRegister.read_function_code(), 0x03);
        assert_eq!(RegisterType::InputRegister.read_function_code(), 0x04);
        assert!(RegisterType::Coil.is_bit());
        assert!(RegisterType::InputRegister.is_word());
    }

    #[test]
    fn test_register_counts() {
        assert_eq!(ModbusDataType::Bool.register_count(), 1);
        assert_eq!(ModbusDataType::UInt16.register_count(), 1);
        assert_eq!(ModbusDataType::Int32.register_count(), 2);
        assert_eq!(ModbusDataType::Float32.register_count(), 2);
        assert_eq!(ModbusDataType::Float64.register_count(), 4);
    }

    #[test]
    fn test_tag_defaults_from_yaml() {
        let tag: ModbusTagConfig = serde_yaml::from_str("tag_id: t1\naddress: 7\n").unwrap();
        assert_eq!(tag.register_type, RegisterType::HoldingRegister);
        assert_eq!(tag.data_type, ModbusDataType::Int16);
        assert_eq!(tag.scale, 1.0);
        assert_eq!(tag.offset, 0.0);
        assert!(tag.byte_order.is_none());
        assert_eq!(tag.effective_byte_order(), ByteOrder::BigEndian);
    }

    #[test]
    fn test_data_type_names() {
        let t: ModbusDataType = serde_yaml::from_str("uint32").unwrap();
        assert_eq!(t, ModbusDataType::UInt32);
        let t: ModbusDataType = serde_yaml::from_str("Float64").unwrap();
        assert_eq!(t, ModbusDataType::Float64);
        assert_eq!(ModbusDataType::UInt16.to_string(), "uint16");

        let err = serde_yaml::from_str::<ModbusDataType>("int128").unwrap_err();
        assert!(err.to_string().contains("int128"));
    }

    #[test]
    fn test_byte_order_aliases() {
        let order: ByteOrder = serde_yaml::from_str("CDAB").unwrap();
        assert_eq!(order, ByteOrder::MidBigEndian);
        let order: ByteOrder = serde_yaml::from_str("legacy_swapped").unwrap();
        assert_eq!(order, ByteOrder::LegacySwapped);
        assert_eq!(ModbusDataType::Float64.default_byte_order(), ByteOrder::LegacySwapped);
    }

    #[test]
    fn test_device_defaults() {
        let config: ModbusDeviceConfig =
            serde_yaml::from_str("device_id: d1\nhost: 10.0.0.1\n").unwrap();
        assert_eq!(config.port, 502);
        assert_eq!(config.unit_id, 1);
        assert_eq!(config.connection_timeout(), Duration::from_millis(5000));
        assert_eq!(config.read_timeout(), Duration::from_millis(1000));
        assert_eq!(config.polling_interval(), Duration::from_millis(1000));
        assert!(config.tags.is_empty());
        assert_eq!(config.display_name(), "d1");
    }

    #[test]
    fn test_validate_rejects_duplicate_tags() {
        let config = ModbusDeviceConfig::new("d1", "localhost")
            .with_tag(ModbusTagConfig::new(
                "a",
                RegisterType::HoldingRegister,
                0,
                ModbusDataType::UInt16,
            ))
            .with_tag(ModbusTagConfig::new(
                "a",
                RegisterType::HoldingRegister,
                1,
                ModbusDataType::UInt16,
            ));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate tag_id 'a'"));
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let config = ModbusDeviceConfig::new("d1", "localhost").with_timeouts(0, 1000);
        assert!(matches!(
            config.validate(),
            Err(ModbusError::Configuration { ref field, .. }) if field == "connection_timeout_ms"
        ));

        let config = ModbusDeviceConfig::new("d1", "localhost").with_polling_interval(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_address_overflow() {
        let tag = ModbusTagConfig::new(
            "t",
            RegisterType::HoldingRegister,
            u16::MAX,
            ModbusDataType::Float32,
        );
        assert!(tag.validate().is_err());

        let tag = ModbusTagConfig::new("t", RegisterType::Coil, u16::MAX, ModbusDataType::Float64);
        assert!(tag.validate().is_ok());
        assert_eq!(tag.read_count(), 1);
    }

    #[test]
    fn test_tag_lookup() {
        let pump = ModbusTagConfig::new("x", RegisterType::Coil, 3, ModbusDataType::Bool);
        let config = ModbusDeviceConfig::new("d1", "localhost").with_tag(pump.with_name("Pump"));
        let tag = config.tag(&TagId::new("x")).unwrap();
        assert_eq!(tag.name.as_deref(), Some("Pump"));
        assert!(config.tag(&TagId::new("y")).is_none());
    }
}
