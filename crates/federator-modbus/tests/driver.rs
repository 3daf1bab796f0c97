// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Driver State Machine Tests
//!
//! Exercises `ModbusDriver` against an in-memory transport:
//!
//! - `test_connect_*`: lifecycle transitions and notifications
//! - `test_read_*`: per-tag decoding, failure capture and ordering
//! - `test_cancel_*`: cooperative cancellation

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use federator_core::{
    DriverError, DriverState, ProtocolDriver, StateChange, TagId, TagQuality, TagReadError, Value,
};
use federator_modbus::{
    ModbusDataType, ModbusDeviceConfig, ModbusDriver, ModbusError, ModbusResult, ModbusTagConfig,
    ModbusTransport, RegisterType,
};

// =============================================================================
// Mock Transport
// =============================================================================

#[derive(Default)]
struct MockTransport {
    words: HashMap<(RegisterType, u16), Vec<u16>>,
    bits: HashMap<(RegisterType, u16), bool>,
    failing: HashSet<u16>,
    connected: bool,
    fail_connect: AtomicBool,
    connect_delay: Duration,
    read_delay: Duration,
    reads: AtomicU64,
    connects: AtomicU64,
    disconnects: AtomicU64,
}

impl MockTransport {
    fn with_words(mut self, register_type: RegisterType, address: u16, words: &[u16]) -> Self {
        self.words.insert((register_type, address), words.to_vec());
        self
    }

    fn with_bit(mut self, register_type: RegisterType, address: u16, bit: bool) -> Self {
        self.bits.insert((register_type, address), bit);
        self
    }

    fn failing_at(mut self, address: u16) -> Self {
        self.failing.insert(address);
        self
    }

    fn fail_connect(self) -> Self {
        self.fail_connect.store(true, Ordering::SeqCst);
        self
    }

    async fn read_words(
        &self,
        register_type: RegisterType,
        address: u16,
    ) -> ModbusResult<Vec<u16>> {
        self.before_read(address).await?;
        self.words
            .get(&(register_type, address))
            .cloned()
            .ok_or_else(|| illegal_address(register_type))
    }

    async fn read_bits(
        &self,
        register_type: RegisterType,
        address: u16,
    ) -> ModbusResult<Vec<bool>> {
        self.before_read(address).await?;
        self.bits
            .get(&(register_type, address))
            .map(|b| vec![*b])
            .ok_or_else(|| illegal_address(register_type))
    }

    async fn before_read(&self, address: u16) -> ModbusResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if !self.connected {
            return Err(ModbusError::NotConnected);
        }
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }
        if self.failing.contains(&address) {
            let reset = io::Error::new(io::ErrorKind::ConnectionReset, "connection reset");
            return Err(reset.into());
        }
        Ok(())
    }
}

fn illegal_address(register_type: RegisterType) -> ModbusError {
    ModbusError::exception(register_type.read_function_code(), "IllegalDataAddress")
}

#[async_trait]
impl ModbusTransport for MockTransport {
    async fn connect(&mut self) -> ModbusResult<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(ModbusError::connection(
                "mock:502",
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
            ));
        }
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> ModbusResult<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn read_coils(&self, address: u16, _count: u16) -> ModbusResult<Vec<bool>> {
        self.read_bits(RegisterType::Coil, address).await
    }

    async fn read_discrete_inputs(&self, address: u16, _count: u16) -> ModbusResult<Vec<bool>> {
        self.read_bits(RegisterType::DiscreteInput, address).await
    }

    async fn read_holding_registers(&self, address: u16, _count: u16) -> ModbusResult<Vec<u16>> {
        self.read_words(RegisterType::HoldingRegister, address).await
    }

    async fn read_input_registers(&self, address: u16, _count: u16) -> ModbusResult<Vec<u16>> {
        self.read_words(RegisterType::InputRegister, address).await
    }

    fn display_name(&self) -> String {
        "mock".to_string()
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn device() -> ModbusDeviceConfig {
    ModbusDeviceConfig::new("plc-01", "mock")
        .with_tag(ModbusTagConfig::new(
            "level",
            RegisterType::HoldingRegister,
            0,
            ModbusDataType::UInt16,
        ))
        .with_tag(
            ModbusTagConfig::new("flow", RegisterType::InputRegister, 10, ModbusDataType::Float32)
                .with_scale(2.0, 1.0),
        )
        .with_tag(ModbusTagConfig::new("pump", RegisterType::Coil, 3, ModbusDataType::Bool))
        .with_tag(ModbusTagConfig::new(
            "door",
            RegisterType::DiscreteInput,
            4,
            ModbusDataType::Bool,
        ))
        .with_tag(ModbusTagConfig::new(
            "broken",
            RegisterType::HoldingRegister,
            20,
            ModbusDataType::Int16,
        ))
        .with_tag(ModbusTagConfig::new(
            "short",
            RegisterType::HoldingRegister,
            30,
            ModbusDataType::Float32,
        ))
        .with_tag(ModbusTagConfig::new(
            "flag",
            RegisterType::HoldingRegister,
            40,
            ModbusDataType::Bool,
        ))
}

fn transport() -> MockTransport {
    MockTransport::default()
        .with_words(RegisterType::HoldingRegister, 0, &[1234])
        .with_words(RegisterType::InputRegister, 10, &[0x4148, 0x0000])
        .with_bit(RegisterType::Coil, 3, true)
        .with_bit(RegisterType::DiscreteInput, 4, false)
        .with_words(RegisterType::HoldingRegister, 30, &[0x4148])
        .with_words(RegisterType::HoldingRegister, 40, &[1])
        .failing_at(20)
}

fn drain(rx: &mut broadcast::Receiver<StateChange>) -> Vec<DriverState> {
    std::iter::from_fn(|| rx.try_recv().ok()).map(|c| c.current).collect()
}

fn ids(names: &[&str]) -> Vec<TagId> {
    names.iter().map(|n| TagId::new(*n)).collect()
}

// =============================================================================
// Connect Tests
// =============================================================================

#[tokio::test]
async fn test_connect_success_publishes_transitions() {
    let mut driver = ModbusDriver::with_transport(device(), transport()).unwrap();
    let mut rx = driver.subscribe_state();

    driver.connect(&CancellationToken::new()).await.unwrap();

    assert_eq!(driver.state(), DriverState::Connected);
    assert!(driver.transport().is_connected());
    assert_eq!(drain(&mut rx), vec![DriverState::Connecting, DriverState::Connected]);
}

#[tokio::test]
async fn test_connect_when_connected_is_noop() {
    let mut driver = ModbusDriver::with_transport(device(), transport()).unwrap();
    let cancel = CancellationToken::new();
    driver.connect(&cancel).await.unwrap();

    let mut rx = driver.subscribe_state();
    driver.connect(&cancel).await.unwrap();

    assert!(drain(&mut rx).is_empty());
    assert_eq!(driver.transport().connects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_connect_failure_enters_error() {
    let mut driver = ModbusDriver::with_transport(device(), transport().fail_connect()).unwrap();
    let mut rx = driver.subscribe_state();

    let err = driver.connect(&CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, DriverError::ConnectionFailed { .. }));
    assert_eq!(driver.state(), DriverState::Error);
    assert!(!driver.transport().is_connected());
    assert!(driver.transport().disconnects.load(Ordering::SeqCst) >= 1);
    assert_eq!(drain(&mut rx), vec![DriverState::Connecting, DriverState::Error]);
}

#[tokio::test]
async fn test_connect_after_error_recovers() {
    let mut driver = ModbusDriver::with_transport(device(), transport().fail_connect()).unwrap();
    let cancel = CancellationToken::new();
    assert!(driver.connect(&cancel).await.is_err());

    driver.transport().fail_connect.store(false, Ordering::SeqCst);
    let mut rx = driver.subscribe_state();
    driver.connect(&cancel).await.unwrap();

    assert_eq!(driver.state(), DriverState::Connected);
    assert_eq!(drain(&mut rx), vec![DriverState::Connecting, DriverState::Connected]);
}

#[tokio::test]
async fn test_disconnect_then_read_fails() {
    let mut driver = ModbusDriver::with_transport(device(), transport()).unwrap();
    let cancel = CancellationToken::new();
    driver.connect(&cancel).await.unwrap();

    let mut rx = driver.subscribe_state();
    driver.disconnect().await;
    driver.disconnect().await;

    assert_eq!(drain(&mut rx), vec![DriverState::Disconnected]);
    let result = driver.read_tags(&ids(&["level"]), &cancel).await;
    assert!(matches!(result, Err(DriverError::NotConnected)));
}

#[tokio::test]
async fn test_close_releases_transport() {
    let mut driver = ModbusDriver::with_transport(device(), transport()).unwrap();
    driver.connect(&CancellationToken::new()).await.unwrap();

    driver.close().await;

    assert_eq!(driver.state(), DriverState::Disconnected);
    assert!(!driver.transport().is_connected());
}

// =============================================================================
// Read Tests
// =============================================================================

#[tokio::test]
async fn test_read_not_connected_issues_no_reads() {
    let driver = ModbusDriver::with_transport(device(), transport()).unwrap();

    let result = driver.read_tags(&driver.tag_ids(), &CancellationToken::new()).await;

    assert!(matches!(result, Err(DriverError::NotConnected)));
    assert_eq!(driver.transport().reads.load(Ordering::SeqCst), 0);
    assert_eq!(driver.state(), DriverState::Disconnected);
}

#[tokio::test]
async fn test_read_all_configured_tags() {
    let mut driver = ModbusDriver::with_transport(device(), transport()).unwrap();
    let cancel = CancellationToken::new();
    driver.connect(&cancel).await.unwrap();
    let mut rx = driver.subscribe_state();

    let values = driver.read_tags(&driver.tag_ids(), &cancel).await.unwrap();
    assert_eq!(values.len(), 7);

    let by_id: HashMap<_, _> = values.iter().map(|v| (v.tag_id.as_str(), v)).collect();

    assert_eq!(by_id["level"].value, Some(Value::Float(1234.0)));
    assert_eq!(by_id["flow"].value, Some(Value::Float(26.0)));
    assert_eq!(by_id["pump"].value, Some(Value::Bool(true)));
    assert_eq!(by_id["door"].value, Some(Value::Bool(false)));
    for good in ["level", "flow", "pump", "door"] {
        assert_eq!(by_id[good].quality, TagQuality::Good, "{good}");
        assert!(by_id[good].error.is_none());
    }

    assert_eq!(by_id["broken"].quality, TagQuality::Bad);
    assert!(by_id["broken"].value.is_none());
    assert!(matches!(by_id["broken"].error, Some(TagReadError::Transport { .. })));

    assert!(matches!(by_id["short"].error, Some(TagReadError::Decode { .. })));
    match &by_id["flag"].error {
        Some(TagReadError::Decode { message }) => assert!(message.contains("bool")),
        other => panic!("unexpected: {other:?}"),
    }

    // Per-tag failures never move the state machine.
    assert_eq!(driver.state(), DriverState::Connected);
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_read_preserves_request_order_and_unknown_tags() {
    let mut driver = ModbusDriver::with_transport(device(), transport()).unwrap();
    let cancel = CancellationToken::new();
    driver.connect(&cancel).await.unwrap();

    let request = ids(&["pump", "ghost", "level", "pump"]);
    let values = driver.read_tags(&request, &cancel).await.unwrap();

    let returned: Vec<_> = values.iter().map(|v| v.tag_id.clone()).collect();
    assert_eq!(returned, request);
    assert_eq!(values[1].quality, TagQuality::Bad);
    assert_eq!(values[1].error, Some(TagReadError::not_found("ghost")));
    assert!(values[0].is_good() && values[2].is_good() && values[3].is_good());
}

#[tokio::test]
async fn test_read_empty_request() {
    let mut driver = ModbusDriver::with_transport(device(), transport()).unwrap();
    let cancel = CancellationToken::new();
    driver.connect(&cancel).await.unwrap();

    let values = driver.read_tags(&[], &cancel).await.unwrap();
    assert!(values.is_empty());
}

#[tokio::test]
async fn test_read_bool_on_register_skips_wire() {
    let mut driver = ModbusDriver::with_transport(device(), transport()).unwrap();
    let cancel = CancellationToken::new();
    driver.connect(&cancel).await.unwrap();

    let values = driver.read_tags(&ids(&["flag"]), &cancel).await.unwrap();
    assert_eq!(values[0].quality, TagQuality::Bad);
    assert_eq!(driver.transport().reads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_read_single_tag() {
    let mut driver = ModbusDriver::with_transport(device(), transport()).unwrap();
    driver.connect(&CancellationToken::new()).await.unwrap();

    let tag = driver.tag(&TagId::new("flow")).unwrap().clone();
    assert_eq!(driver.read_tag(&tag).await, Ok(Value::Float(26.0)));

    let tag = driver.tag(&TagId::new("broken")).unwrap().clone();
    assert!(matches!(driver.read_tag(&tag).await, Err(TagReadError::Transport { .. })));
}

// =============================================================================
// Cancellation Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_during_connect() {
    let slow = MockTransport {
        connect_delay: Duration::from_secs(30),
        ..transport()
    };
    let mut driver = ModbusDriver::with_transport(device(), slow).unwrap();
    let mut rx = driver.subscribe_state();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = driver.connect(&cancel).await.unwrap_err();

    assert!(matches!(err, DriverError::Cancelled));
    assert_eq!(driver.state(), DriverState::Disconnected);
    assert!(!driver.transport().is_connected());
    assert_eq!(drain(&mut rx), vec![DriverState::Connecting, DriverState::Disconnected]);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_read_keeps_state() {
    let slow = MockTransport {
        read_delay: Duration::from_secs(30),
        ..transport()
    };
    let mut driver = ModbusDriver::with_transport(device(), slow).unwrap();
    let cancel = CancellationToken::new();
    driver.connect(&cancel).await.unwrap();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = driver.read_tags(&driver.tag_ids(), &cancel).await;

    assert!(matches!(result, Err(DriverError::Cancelled)));
    assert_eq!(driver.state(), DriverState::Connected);
}
