// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the federator binary.

use thiserror::Error;

/// Result type alias for federator-bin operations.
pub type BinResult<T> = Result<T, BinError>;

/// Errors that end the process.
#[derive(Debug, Error)]
pub enum BinError {
    /// Configuration could not be loaded or validated.
    #[error("Config error: {0}")]
    Config(#[from] federator_config::ConfigError),

    /// A driver could not be built or failed fatally.
    #[error("Driver error: {0}")]
    Driver(#[from] federator_core::DriverError),

    /// Runtime error.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Error with context.
    #[error("{context}: {source}")]
    WithContext {
        /// The context description.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<BinError>,
    },
}

impl BinError {
    /// Creates a runtime error.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Adds context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 1,
            Self::Driver(_) => 2,
            Self::Runtime(_) => 3,
            Self::WithContext { source, .. } => source.exit_code(),
        }
    }
}
