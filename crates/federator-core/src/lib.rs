// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # federator-core
//!
//! Driver contract and shared types for the federator field-bus reader.
//!
//! This crate provides what every protocol driver and the host agree on:
//!
//! - **Types**: `DeviceId`, `TagId`, `Value`, `TagValue`, `TagQuality`, `DriverState`
//! - **Error**: `DriverError` for whole operations, `TagReadError` for single tags
//! - **Driver**: The `ProtocolDriver` trait and the factory registry
//! - **State**: The state-change broadcast channel
//!
//! ## Example
//!
//! ```
//! use federator_core::types::{TagValue, Value};
//!
//! let reading = TagValue::good("temperature", Value::Float(25.5));
//! assert!(reading.is_good());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod driver;
pub mod error;
pub mod state;
pub mod types;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use driver::{DriverConfig, DriverFactory, DriverRegistry, ProtocolDriver};
pub use error::{DriverError, TagReadError};
pub use state::StateNotifier;
pub use types::*;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
