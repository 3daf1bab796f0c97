// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # federator-modbus
//!
//! Modbus TCP driver for the federator field-bus reader.
//!
//! - **Register codec**: Raw words and bits to scaled, typed values
//! - **All read categories**: Coil, Discrete Input, Holding Register, Input Register
//! - **Protocol driver**: Implements `federator_core::ProtocolDriver`
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                ModbusDriver                 │
//! │   (ProtocolDriver impl, state machine)      │
//! └─────────────────────────────────────────────┘
//!            │                       │
//!            ▼                       ▼
//! ┌─────────────────────┐   ┌─────────────────────┐
//! │   ModbusTransport   │   │        codec        │
//! │  (FC 01/02/03/04)   │   │   (pure decoding)   │
//! └─────────────────────┘   └─────────────────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  ModbusTcpTransport │
//! │    (tokio-modbus)   │
//! └─────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use federator_core::ProtocolDriver;
//! use federator_modbus::{
//!     ModbusDataType, ModbusDeviceConfig, ModbusTagConfig, ModbusTcpDriver, RegisterType,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! let config = ModbusDeviceConfig::new("plc-01", "192.168.1.100")
//!     .with_tag(
//!         ModbusTagConfig::new("temp", RegisterType::InputRegister, 0, ModbusDataType::Int16)
//!             .with_scale(0.1, 0.0),
//!     );
//!
//! let mut driver = ModbusTcpDriver::from_config(config)?;
//! let cancel = CancellationToken::new();
//! driver.connect(&cancel).await?;
//! for value in driver.read_tags(&driver.tag_ids(), &cancel).await? {
//!     println!("{value}");
//! }
//! driver.close().await;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod codec;
pub mod driver;
pub mod error;
pub mod types;

pub use client::{ModbusTcpTransport, ModbusTransport};
pub use codec::DecodeError;
pub use driver::{ModbusDriver, ModbusDriverFactory, ModbusTcpDriver};
pub use error::{ModbusError, ModbusResult};
pub use types::{ByteOrder, ModbusDataType, ModbusDeviceConfig, ModbusTagConfig, RegisterType};
