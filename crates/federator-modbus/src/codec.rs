// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Register codec.
//!
//! Pure functions that turn raw Modbus words and bits into tag values. No
//! I/O happens here and every function is deterministic.
//!
//! # Multi-register layout
//!
//! 32-bit encodings default to big-endian: `(word[0] << 16) | word[1]`.
//! `float64` defaults to [`ByteOrder::LegacySwapped`]: each word is laid out
//! high byte then low byte, words in wire order, and the eight bytes are read
//! as a little-endian double. A tag's `byte_order` overrides either default.
//!
//! ```
//! use federator_modbus::codec::decode_registers;
//! use federator_modbus::types::{ModbusDataType, ModbusTagConfig, RegisterType};
//!
//! let tag = ModbusTagConfig::new("t", RegisterType::HoldingRegister, 0, ModbusDataType::Float32);
//! assert_eq!(decode_registers(&[0x4148, 0x0000], &tag).unwrap(), 12.5);
//! ```

use thiserror::Error;

use crate::types::{ByteOrder, ModbusDataType, ModbusTagConfig, RegisterType};

/// Why registers could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The encoding cannot be produced from this data category.
    #[error("Encoding '{data_type}' is not supported for {register_type} reads")]
    UnsupportedEncoding {
        /// The configured encoding.
        data_type: ModbusDataType,
        /// The category that was read.
        register_type: RegisterType,
    },

    /// The response carried the wrong number of units.
    #[error("Expected {expected} value(s) for '{data_type}', got {actual}")]
    WordCount {
        /// The configured encoding.
        data_type: ModbusDataType,
        /// Units the encoding needs.
        expected: usize,
        /// Units received.
        actual: usize,
    },
}

/// Number of registers an encoding occupies.
#[inline]
pub const fn register_count(data_type: ModbusDataType) -> u16 {
    data_type.register_count()
}

/// Applies `raw * scale + offset`.
#[inline]
pub fn apply_scaling(raw: f64, scale: f64, offset: f64) -> f64 {
    raw * scale + offset
}

/// Decodes a coil or discrete input response.
///
/// Only the first bit is used. Scaling never applies to bits.
pub fn decode_bits(bits: &[bool], tag: &ModbusTagConfig) -> Result<bool, DecodeError> {
    bits.first().copied().ok_or(DecodeError::WordCount {
        data_type: tag.data_type,
        expected: 1,
        actual: 0,
    })
}

/// Decodes a register response into a scaled value.
///
/// # Errors
///
/// - `DecodeError::UnsupportedEncoding` - `bool` requested from registers
/// - `DecodeError::WordCount` - `words` does not match the encoding width
pub fn decode_registers(words: &[u16], tag: &ModbusTagConfig) -> Result<f64, DecodeError> {
    let raw = decode_raw(words, tag.data_type, tag.effective_byte_order()).map_err(|e| match e {
        DecodeError::UnsupportedEncoding { data_type, .. } => DecodeError::UnsupportedEncoding {
            data_type,
            register_type: tag.register_type,
        },
        other => other,
    })?;
    Ok(apply_scaling(raw, tag.scale, tag.offset))
}

/// Decodes registers into an unscaled numeric value.
pub fn decode_raw(
    words: &[u16],
    data_type: ModbusDataType,
    byte_order: ByteOrder,
) -> Result<f64, DecodeError> {
    let unsupported = DecodeError::UnsupportedEncoding {
        data_type,
        register_type: RegisterType::HoldingRegister,
    };
    if data_type == ModbusDataType::Bool {
        return Err(unsupported);
    }

    let expected = usize::from(data_type.register_count());
    if words.len() != expected {
        return Err(DecodeError::WordCount {
            data_type,
            expected,
            actual: words.len(),
        });
    }

    let bytes = layout(words, byte_order);
    let value = match data_type {
        ModbusDataType::Int16 => f64::from(words[0] as i16),
        ModbusDataType::UInt16 => f64::from(words[0]),
        ModbusDataType::Int32 => f64::from(i32::from_be_bytes(to_array(&bytes))),
        ModbusDataType::UInt32 => f64::from(u32::from_be_bytes(to_array(&bytes))),
        ModbusDataType::Float32 => f64::from(f32::from_be_bytes(to_array(&bytes))),
        ModbusDataType::Float64 => f64::from_be_bytes(to_array(&bytes)),
        ModbusDataType::Bool => return Err(unsupported),
    };
    Ok(value)
}

/// Arranges register bytes most significant first.
fn layout(words: &[u16], byte_order: ByteOrder) -> Vec<u8> {
    let reverse_words = matches!(byte_order, ByteOrder::LittleEndian | ByteOrder::MidBigEndian);
    let low_byte_first = matches!(byte_order, ByteOrder::LittleEndian | ByteOrder::MidLittleEndian);

    let ordered: Vec<u16> = if reverse_words {
        words.iter().rev().copied().collect()
    } else {
        words.to_vec()
    };

    let mut bytes = Vec::with_capacity(ordered.len() * 2);
    for word in ordered {
        let [hi, lo] = word.to_be_bytes();
        if low_byte_first {
            bytes.extend_from_slice(&[lo, hi]);
        } else {
            bytes.extend_from_slice(&[hi, lo]);
        }
    }

    if byte_order == ByteOrder::LegacySwapped {
        bytes.reverse();
    }
    bytes
}

fn to_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

// =============================================================================
// Tests
// =============================================================================
