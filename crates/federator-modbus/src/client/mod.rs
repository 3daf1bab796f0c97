// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus client transports.
//!
//! [`ModbusTransport`] is the seam between the driver state machine and the
//! wire. [`ModbusTcpTransport`] implements it over `tokio-modbus`; tests plug
//! in their own implementations.

mod tcp;
mod transport;

pub use tcp::ModbusTcpTransport;
pub use transport::ModbusTransport;
