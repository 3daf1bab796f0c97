// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus TCP transport implementation on top of `tokio-modbus`.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::{lookup_host, TcpStream};
use tokio::sync::Mutex;
use tokio::time::{error::Elapsed, timeout};
use tokio_modbus::client::Context as ModbusContext;
use tokio_modbus::prelude::*;
use tokio_modbus::{Error as TokioModbusError, ExceptionCode};

use crate::error::{ModbusError, ModbusResult};
use crate::types::{ModbusDeviceConfig, RegisterType};

use super::transport::ModbusTransport;

type RawResponse<T> = Result<Result<Result<T, ExceptionCode>, TokioModbusError>, Elapsed>;

// =============================================================================
// ModbusTcpTransport
// =============================================================================

/// Modbus TCP transport using tokio-modbus.
///
/// The session lives in an `Option` slot. It is filled by a successful
/// `connect` and emptied by `disconnect` or by dropping the transport.
///
/// # Unanswered requests
///
/// A read that times out, or whose future is dropped, leaves its request on
/// the wire. The device may still answer it, and that reply would be taken
/// as the answer to the next request. The transport marks every request in
/// flight until a complete response arrives. If the mark is still set when
/// the next read starts, the session is replaced with a fresh connection
/// first, which discards the late reply together with the old socket.
pub struct ModbusTcpTransport {
    host: String,
    port: u16,
    unit_id: u8,
    connect_timeout: Duration,
    operation_timeout: Duration,
    context: Mutex<Option<ModbusContext>>,
    connected: bool,
    in_flight: AtomicBool,
    session_resets: AtomicU64,
}

impl ModbusTcpTransport {
    /// Creates a disconnected transport for the given device.
    pub fn new(config: &ModbusDeviceConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            unit_id: config.unit_id,
            connect_timeout: config.connection_timeout(),
            operation_timeout: config.read_timeout(),
            context: Mutex::new(None),
            connected: false,
            in_flight: AtomicBool::new(false),
            session_resets: AtomicU64::new(0),
        }
    }

    /// Returns the `host:port` target.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Number of times a session was replaced after an unanswered request.
    pub fn session_resets(&self) -> u64 {
        self.session_resets.load(Ordering::Relaxed)
    }

    async fn open(&self) -> ModbusResult<ModbusContext> {
        let target = self.target();
        let addr = lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| ModbusError::connection(&target, e))?
            .next()
            .ok_or_else(|| {
                ModbusError::connection(
                    &target,
                    io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses"),
                )
            })?;

        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| ModbusError::connection(&target, e))?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(addr = %target, error = %e, "Failed to set TCP_NODELAY");
        }

        Ok(tcp::attach_slave(stream, Slave(self.unit_id)))
    }

    /// Returns a session that has no request outstanding.
    async fn ready_session<'a>(
        &self,
        slot: &'a mut Option<ModbusContext>,
    ) -> ModbusResult<&'a mut ModbusContext> {
        if !self.connected {
            return Err(ModbusError::NotConnected);
        }

        if self.in_flight.load(Ordering::Acquire) || slot.is_none() {
            // Dropping the old context closes its socket and any late reply.
            slot.take();
            self.session_resets.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                host = %self.host,
                port = self.port,
                "Reopening Modbus session after an unanswered request"
            );

            let ctx = timeout(self.connect_timeout, self.open())
                .await
                .map_err(|_| ModbusError::timeout("reconnect", self.connect_timeout))??;
            *slot = Some(ctx);
            self.in_flight.store(false, Ordering::Release);
        }

        slot.as_mut().ok_or(ModbusError::NotConnected)
    }

    /// Maps a raw response and clears the in-flight mark once the device
    /// has answered.
    fn finish<T>(&self, register_type: RegisterType, response: RawResponse<T>) -> ModbusResult<T> {
        let function_code = register_type.read_function_code();
        match response {
            Err(_) => Err(ModbusError::timeout("read", self.operation_timeout)),
            Ok(Err(TokioModbusError::Transport(e))) => Err(ModbusError::Io(e)),
            Ok(Err(TokioModbusError::Protocol(e))) => Err(ModbusError::protocol(e.to_string())),
            Ok(Ok(result)) => {
                self.in_flight.store(false, Ordering::Release);
                result.map_err(|exception| {
                    ModbusError::exception(function_code, format!("{:?}", exception))
                })
            }
        }
    }

    fn check_len<T>(&self, values: Vec<T>, count: u16) -> ModbusResult<Vec<T>> {
        if values.len() < usize::from(count) {
            return Err(ModbusError::protocol(format!(
                "expected {} values, device returned {}",
                count,
                values.len()
            )));
        }
        Ok(values)
    }
}

#[async_trait]
impl ModbusTransport for ModbusTcpTransport {
    async fn connect(&mut self) -> ModbusResult<()> {
        if self.connected {
            return Ok(());
        }

        // Dropping the future on timeout releases any half-open socket.
        let ctx = timeout(self.connect_timeout, self.open())
            .await
            .map_err(|_| ModbusError::timeout("connect", self.connect_timeout))??;

        *self.context.lock().await = Some(ctx);
        self.connected = true;
        self.in_flight.store(false, Ordering::Release);

        tracing::debug!(
            host = %self.host,
            port = self.port,
            unit_id = self.unit_id,
            "Connected to Modbus TCP device"
        );
        Ok(())
    }

    async fn disconnect(&mut self) -> ModbusResult<()> {
        let taken = self.context.lock().await.take();
        self.connected = false;
        self.in_flight.store(false, Ordering::Release);

        if let Some(mut ctx) = taken {
            if let Err(e) = ctx.disconnect().await {
                tracing::warn!(
                    host = %self.host,
                    port = self.port,
                    error = %e,
                    "Error disconnecting from Modbus device"
                );
            }
            tracing::debug!(
                host = %self.host,
                port = self.port,
                "Disconnected from Modbus TCP device"
            );
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn read_coils(&self, address: u16, count: u16) -> ModbusResult<Vec<bool>> {
        let mut guard = self.context.lock().await;
        let ctx = self.ready_session(&mut *guard).await?;
        self.in_flight.store(true, Ordering::Release);
        let response = timeout(self.operation_timeout, ctx.read_coils(address, count)).await;
        let values = self.finish(RegisterType::Coil, response)?;
        self.check_len(values, count)
    }

    async fn read_discrete_inputs(&self, address: u16, count: u16) -> ModbusResult<Vec<bool>> {
        let mut guard = self.context.lock().await;
        let ctx = self.ready_session(&mut *guard).await?;
        self.in_flight.store(true, Ordering::Release);
        let response =
            timeout(self.operation_timeout, ctx.read_discrete_inputs(address, count)).await;
        let values = self.finish(RegisterType::DiscreteInput, response)?;
        self.check_len(values, count)
    }

    async fn read_holding_registers(&self, address: u16, count: u16) -> ModbusResult<Vec<u16>> {
        let mut guard = self.context.lock().await;
        let ctx = self.ready_session(&mut *guard).await?;
        self.in_flight.store(true, Ordering::Release);
        let response =
            timeout(self.operation_timeout, ctx.read_holding_registers(address, count)).await;
        self.finish(RegisterType::HoldingRegister, response)
    }

    async fn read_input_registers(&self, address: u16, count: u16) -> ModbusResult<Vec<u16>> {
        let mut guard = self.context.lock().await;
        let ctx = self.ready_session(&mut *guard).await?;
        self.in_flight.store(true, Ordering::Release);
        let response =
            timeout(self.operation_timeout, ctx.read_input_registers(address, count)).await;
        self.finish(RegisterType::InputRegister, response)
    }

    fn display_name(&self) -> String {
        format!("tcp://{}:{}/{}", self.host, self.port, self.unit_id)
    }
}

impl fmt::Debug for ModbusTcpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModbusTcpTransport")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("unit_id", &self.unit_id)
            .field("connected", &self.connected)
            .field("session_resets", &self.session_resets())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ModbusDeviceConfig {
        ModbusDeviceConfig::new("d1", "127.0.0.1")
            .with_port(1502)
            .with_unit_id(7)
            .with_timeouts(200, 100)
    }

    #[test]
    fn test_new_transport_is_disconnected() {
        let transport = ModbusTcpTransport::new(&config());
        assert!(!transport.is_connected());
        assert_eq!(transport.target(), "127.0.0.1:1502");
        assert_eq!(transport.display_name(), "tcp://127.0.0.1:1502/7");
    }

    #[tokio::test]
    async fn test_read_without_session() {
        let transport = ModbusTcpTransport::new(&config());
        let err = transport.read_holding_registers(0, 1).await.unwrap_err();
        assert!(matches!(err, ModbusError::NotConnected));
        assert_eq!(transport.session_resets(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_when_not_connected() {
        let mut transport = ModbusTcpTransport::new(&config());
        transport.disconnect().await.unwrap();
        transport.disconnect().await.unwrap();
        assert!(!transport.is_connected());
    }
}
