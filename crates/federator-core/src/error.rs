// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types shared by every protocol driver.
//!
//! Two families exist and they travel differently:
//!
//! ```text
//! DriverError    - whole-operation failures, propagated to the caller
//! TagReadError   - per-tag failures, captured inside a Bad TagValue
//! ```
//!
//! A failing tag never aborts a batch read, so [`TagReadError`] is `Clone` and
//! serializable and lives on the reading itself.
//!
//! # Examples
//!
//! ```
//! use federator_core::error::DriverError;
//! use std::time::Duration;
//!
//! let error = DriverError::timeout(Duration::from_secs(5));
//! assert!(error.is_retryable());
//! assert!(!DriverError::Cancelled.is_retryable());
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// DriverError
// =============================================================================

/// Errors returned by driver lifecycle and batch operations.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Connection could not be established.
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        /// Error message.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("Operation timed out after {duration:?}")]
    Timeout {
        /// The timeout duration.
        duration: Duration,
    },

    /// Device is not connected.
    #[error("Device is not connected")]
    NotConnected,

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// Driver configuration is invalid.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },

    /// Protocol-level error.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Error message.
        message: String,
    },
}

impl DriverError {
    /// Creates a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a connection failed error with a source.
    pub fn connection_failed_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout { duration }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Returns `true` if a later attempt may succeed.
    ///
    /// Connection failures and timeouts are transient. Cancellation and
    /// configuration problems are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DriverError::ConnectionFailed { .. }
                | DriverError::Timeout { .. }
                | DriverError::NotConnected
        )
    }

    /// Returns the error type as a string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            DriverError::ConnectionFailed { .. } => "connection_failed",
            DriverError::Timeout { .. } => "timeout",
            DriverError::NotConnected => "not_connected",
            DriverError::Cancelled => "cancelled",
            DriverError::InvalidConfig { .. } => "invalid_config",
            DriverError::Protocol { .. } => "protocol",
        }
    }
}

// =============================================================================
// TagReadError
// =============================================================================

/// Why a single tag produced a Bad reading.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TagReadError {
    /// The requested tag id is not configured on the device.
    #[error("Tag not found: {tag_id}")]
    NotFound {
        /// The unknown tag id.
        tag_id: String,
    },

    /// The registers were read but could not be decoded.
    #[error("Decode failed: {message}")]
    Decode {
        /// Error message.
        message: String,
    },

    /// The wire read failed.
    #[error("Transport failure: {message}")]
    Transport {
        /// Error message.
        message: String,
    },
}

impl TagReadError {
    /// Creates a not found error.
    pub fn not_found(tag_id: impl Into<String>) -> Self {
        Self::NotFound {
            tag_id: tag_id.into(),
        }
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
