// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for Modbus operations.
//!
//! # Error Hierarchy
//!
//! ```text
//! ModbusError
//! ├── Connection     - TCP connect / DNS failures
//! ├── Timeout        - connect or response deadline exceeded
//! ├── NotConnected   - no session is held
//! ├── Exception      - device answered with a Modbus exception
//! ├── Protocol       - malformed or unexpected frame
//! ├── Io             - transport I/O failure on an open session
//! ├── Decode         - registers could not be turned into a value
//! └── Configuration  - invalid device or tag configuration
//! ```
//!
//! Whole-operation failures convert into [`DriverError`]. Per-tag failures
//! become a [`TagReadError`] through [`ModbusError::into_tag_error`].

use std::io;
use std::time::Duration;

use federator_core::error::{DriverError, TagReadError};
use thiserror::Error;
use tracing::Level;

use crate::codec::DecodeError;

/// Result alias for Modbus operations.
pub type ModbusResult<T> = Result<T, ModbusError>;

/// Errors raised by the Modbus transport and driver.
#[derive(Debug, Error)]
pub enum ModbusError {
    /// Could not open the TCP connection.
    #[error("Connection to {target} failed: {source}")]
    Connection {
        /// `host:port` that was dialled.
        target: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// An operation exceeded its deadline.
    #[error("{operation} timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
        /// The deadline that was exceeded.
        duration: Duration,
    },

    /// No session is held.
    #[error("Not connected to Modbus device")]
    NotConnected,

    /// The device returned a Modbus exception response.
    #[error("Modbus exception on function code {function_code:#04x}: {exception}")]
    Exception {
        /// Function code of the request.
        function_code: u8,
        /// Exception reported by the device.
        exception: String,
    },

    /// The response frame was malformed or did not match the request.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Error message.
        message: String,
    },

    /// I/O failure on an open session.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Register data could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Invalid configuration.
    #[error("Invalid configuration for '{field}': {message}")]
    Configuration {
        /// The offending field.
        field: String,
        /// Error message.
        message: String,
    },
}

impl ModbusError {
    // =========================================================================
    // Factory Methods
    // =========================================================================

    /// Creates a connection error.
    pub fn connection(target: impl Into<String>, source: io::Error) -> Self {
        Self::Connection {
            target: target.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(operation: &'static str, duration: Duration) -> Self {
        Self::Timeout {
            operation,
            duration,
        }
    }

    /// Creates an exception error.
    pub fn exception(function_code: u8, exception: impl Into<String>) -> Self {
        Self::Exception {
            function_code,
            exception: exception.into(),
        }
    }

    /// Creates a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    // =========================================================================
    // Classification
    // =========================================================================

    /// Returns `true` if a later attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Timeout { .. } | Self::NotConnected | Self::Io(_)
        )
    }

    /// Returns the error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection { .. } | Self::NotConnected => "connection",
            Self::Timeout { .. } => "timeout",
            Self::Exception { .. } | Self::Protocol { .. } => "protocol",
            Self::Io(_) => "io",
            Self::Decode(_) => "decode",
            Self::Configuration { .. } => "configuration",
        }
    }

    /// Returns the tracing level appropriate for this error.
    ///
    /// Device-side answers (exceptions, undecodable data) are expected in
    /// the field and logged at debug. Transport trouble is a warning.
    pub fn tracing_level(&self) -> Level {
        match self {
            Self::Configuration { .. } => Level::ERROR,
            Self::Exception { .. } | Self::Decode(_) => Level::DEBUG,
            _ => Level::WARN,
        }
    }

    /// Logs this error with structured fields at its own level.
    pub fn log(&self, device_id: &str, context: &str) {
        match self.tracing_level() {
            Level::ERROR => tracing::error!(
                device_id,
                category = self.category(),
                context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            Level::WARN => tracing::warn!(
                device_id,
                category = self.category(),
                context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            _ => tracing::debug!(
                device_id,
                category = self.category(),
                context,
                retryable = self.is_retryable(),
                "{self}"
            ),
        }
    }

    /// Converts this error into the per-tag failure recorded on a Bad reading.
    pub fn into_tag_error(self) -> TagReadError {
        match self {
            Self::Decode(e) => TagReadError::decode(e.to_string()),
            other => TagReadError::transport(other.to_string()),
        }
    }
}

impl From<ModbusError> for DriverError {
    fn from(error: ModbusError) -> Self {
        match error {
            ModbusError::Connection { target, source } => {
                let message = format!("Connection to {} failed", target);
                DriverError::connection_failed_with(message, source)
            }
            ModbusError::Timeout { duration, .. } => DriverError::timeout(duration),
            ModbusError::NotConnected => DriverError::NotConnected,
            ModbusError::Configuration { field, message } => {
                DriverError::invalid_config(format!("{}: {}", field, message))
            }
            ModbusError::Io(e) => DriverError::connection_failed_with("Transport I/O failure", e),
            other => DriverError::protocol(other.to_string()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
