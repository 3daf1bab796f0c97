// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Abstract transport layer for Modbus communication.

use async_trait::async_trait;

use crate::error::ModbusResult;

/// Owns one Modbus session and performs the four read function codes.
///
/// `connect` and `disconnect` need exclusive access. Reads take `&self` and
/// are serialized by the implementation.
///
/// Every read is bounded by the transport's per-operation timeout. Callers
/// may additionally drop a read future to abandon it. A read that timed out
/// or was abandoned must not affect the next one, so implementations
/// resynchronize the session before reusing it.
#[async_trait]
pub trait ModbusTransport: Send + Sync {
    /// Opens the session. Partial resources are released on failure.
    async fn connect(&mut self) -> ModbusResult<()>;

    /// Closes the session. Safe to call when not connected.
    async fn disconnect(&mut self) -> ModbusResult<()>;

    /// Returns `true` if a session is held.
    fn is_connected(&self) -> bool;

    /// FC 0x01.
    async fn read_coils(&self, address: u16, count: u16) -> ModbusResult<Vec<bool>>;

    /// FC 0x02.
    async fn read_discrete_inputs(&self, address: u16, count: u16) -> ModbusResult<Vec<bool>>;

    /// FC 0x03.
    async fn read_holding_registers(&self, address: u16, count: u16) -> ModbusResult<Vec<u16>>;

    /// FC 0x04.
    async fn read_input_registers(&self, address: u16, count: u16) -> ModbusResult<Vec<u16>>;

    /// Human-readable endpoint for logging.
    fn display_name(&self) -> String;
}
