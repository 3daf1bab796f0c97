// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core data types for federator.
//!
//! This module provides the protocol-agnostic types that every driver hands
//! back to the host: identifiers, decoded values, quality annotations and the
//! connection state of a driver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TagReadError;

// =============================================================================
// Identifiers
// =============================================================================

/// A unique identifier for a device.
///
/// Device IDs are stable across restarts and unique within a host process.
///
/// # Examples
///
/// ```
/// use federator_core::types::DeviceId;
///
/// let id = DeviceId::new("plc-001");
/// assert_eq!(id.as_str(), "plc-001");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a new device ID.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A unique identifier for a tag within a device.
///
/// # Examples
///
/// ```
/// use federator_core::types::TagId;
///
/// let id = TagId::new("temperature");
/// assert_eq!(id.as_str(), "temperature");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(String);

impl TagId {
    /// Creates a new tag ID.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TagId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TagId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for TagId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Value
// =============================================================================

/// A decoded tag value.
///
/// Numeric readings are always carried as `f64` after scaling, regardless of
/// the width of the source registers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Single-bit reading from a coil or discrete input.
    Bool(bool),
    /// Scaled numeric reading.
    Float(f64),
}

impl Value {
    /// Returns the boolean payload, if any.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::Float(_) => None,
        }
    }

    /// Returns the numeric payload, if any.
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Bool(_) => None,
        }
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Float(_) => "float",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

// =============================================================================
// Tag Quality
// =============================================================================

/// Reliability annotation on a reading.
///
/// Follows the OPC UA quality vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagQuality {
    /// The value was read and decoded successfully.
    Good,
    /// The value could not be read or decoded.
    Bad,
    /// The value was read but its reliability is questionable.
    Uncertain,
}

impl TagQuality {
    /// Returns `true` if the quality is good.
    #[inline]
    pub fn is_good(&self) -> bool {
        matches!(self, TagQuality::Good)
    }

    /// Returns `true` if the quality is bad.
    #[inline]
    pub fn is_bad(&self) -> bool {
        matches!(self, TagQuality::Bad)
    }
}

impl fmt::Display for TagQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagQuality::Good => write!(f, "Good"),
            TagQuality::Bad => write!(f, "Bad"),
            TagQuality::Uncertain => write!(f, "Uncertain"),
        }
    }
}

// =============================================================================
// TagValue
// =============================================================================

/// A single reading of one tag.
///
/// Tag values are produced once per read attempt and never mutated. The
/// constructors keep the quality invariant: a [`TagQuality::Bad`] reading has
/// no value and always carries the failure that caused it.
///
/// # Examples
///
/// ```
/// use federator_core::types::{TagId, TagQuality, TagValue, Value};
/// use federator_core::error::TagReadError;
///
/// let good = TagValue::good("flow", Value::Float(12.5));
/// assert!(good.quality.is_good());
///
/// let bad = TagValue::bad("missing", TagReadError::not_found("missing"));
/// assert_eq!(bad.quality, TagQuality::Bad);
/// assert!(bad.value.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagValue {
    /// The tag this reading belongs to.
    pub tag_id: TagId,

    /// The decoded value, absent when the read failed.
    pub value: Option<Value>,

    /// Quality of the reading.
    pub quality: TagQuality,

    /// When the reading was captured.
    pub timestamp: DateTime<Utc>,

    /// Why the reading is not usable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TagReadError>,
}

impl TagValue {
    /// Creates a good reading stamped with the current time.
    pub fn good(tag_id: impl Into<TagId>, value: Value) -> Self {
        Self {
            tag_id: tag_id.into(),
            value: Some(value),
            quality: TagQuality::Good,
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// Creates a bad reading stamped with the current time.
    pub fn bad(tag_id: impl Into<TagId>, error: TagReadError) -> Self {
        Self {
            tag_id: tag_id.into(),
            value: None,
            quality: TagQuality::Bad,
            timestamp: Utc::now(),
            error: Some(error),
        }
    }

    /// Creates an uncertain reading stamped with the current time.
    pub fn uncertain(tag_id: impl Into<TagId>, value: Value) -> Self {
        Self {
            tag_id: tag_id.into(),
            value: Some(value),
            quality: TagQuality::Uncertain,
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// Returns `true` if the reading is good.
    #[inline]
    pub fn is_good(&self) -> bool {
        self.quality.is_good()
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.value, &self.error) {
            (Some(value), _) => write!(f, "{} = {} ({})", self.tag_id, value, self.quality),
            (None, Some(error)) => write!(f, "{} = <{}> ({})", self.tag_id, error, self.quality),
            (None, None) => write!(f, "{} = <none> ({})", self.tag_id, self.quality),
        }
    }
}

// =============================================================================
// Protocol
// =============================================================================

/// Protocols a driver can implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Modbus over TCP.
    ModbusTcp,
}

impl Protocol {
    /// Returns the protocol name as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::ModbusTcp => "modbus_tcp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Driver State
// =============================================================================

/// Connection state of a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DriverState {
    /// No session is held.
    #[default]
    Disconnected,

    /// A connection attempt is in progress.
    Connecting,

    /// A session is open and reads are allowed.
    Connected,

    /// The last connection attempt failed. Re-enterable via `connect`.
    Error,
}

impl DriverState {
    /// Returns `true` if reads are allowed in this state.
    #[inline]
    pub fn is_connected(&self) -> bool {
        matches!(self, DriverState::Connected)
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverState::Disconnected => write!(f, "Disconnected"),
            DriverState::Connecting => write!(f, "Connecting"),
            DriverState::Connected => write!(f, "Connected"),
            DriverState::Error => write!(f, "Error"),
        }
    }
}

/// A published driver state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    /// The device whose driver changed state.
    pub device_id: DeviceId,
    /// State before the transition.
    pub previous: DriverState,
    /// State after the transition.
    pub current: DriverState,
    /// When the transition happened.
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for StateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} -> {}", self.device_id, self.previous, self.current)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers() {
        let device = DeviceId::new("plc-01");
        assert_eq!(device.to_string(), "plc-01");
        assert_eq!(DeviceId::from("plc-01"), device);

        let tag = TagId::from(String::from("temperature"));
        assert_eq!(tag.as_str(), "temperature");
    }

    #[test]
    fn test_good_value_carries_no_error() {
        let value = TagValue::good("reg0", Value::Float(100.0));
        assert!(value.is_good());
        assert_eq!(value.value.and_then(|v| v.as_f64()), Some(100.0));
        assert!(value.error.is_none());
    }

    #[test]
    fn test_bad_value_has_no_value() {
        let value = TagValue::bad("reg0", TagReadError::transport("connection reset"));
        assert_eq!(value.quality, TagQuality::Bad);
        assert!(value.value.is_none());
        assert!(matches!(value.error, Some(TagReadError::Transport { .. })));
        assert!(value.to_string().contains("connection reset"));
    }

    #[test]
    fn test_uncertain_value() {
        let value = TagValue::uncertain("reg0", Value::Bool(true));
        assert_eq!(value.quality, TagQuality::Uncertain);
        assert!(!value.quality.is_good());
        assert!(!value.quality.is_bad());
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Bool(true).as_f64(), None);
        assert_eq!(Value::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::Float(1.5).type_name(), "float");
    }

    #[test]
    fn test_value_serialization() {
        let json = serde_json::to_value(Value::Float(2.5)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "float", "value": 2.5}));
    }

    #[test]
    fn test_driver_state() {
        assert_eq!(DriverState::default(), DriverState::Disconnected);
        assert!(DriverState::Connected.is_connected());
        assert!(!DriverState::Error.is_connected());
        assert_eq!(DriverState::Connecting.to_string(), "Connecting");
    }

    #[test]
    fn test_protocol_serde_name() {
        let protocol: Protocol = serde_json::from_str("\"modbus_tcp\"").unwrap();
        assert_eq!(protocol, Protocol::ModbusTcp);
        assert_eq!(protocol.to_string(), "modbus_tcp");
    }
}
