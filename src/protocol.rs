/*
 * This file is part of smctool.
 *
 * Copyright (C) 2025 smctool contributors
 *
 * smctool is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * smctool is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with smctool. If not, see <https://www.gnu.org/licenses/>.
 */

//! Key access: reading, writing and counting controller keys.
//!
//! A read is two calls, strictly in order: key info (size and type), then the
//! bytes. A write re-reads the key first because the controller only accepts
//! payloads of the key's registered size.

use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::codec::{self, CodecError};
use crate::logger;
use crate::transport::{KeyData, Session, Transport, TransportError, SMC_SELECTOR};
use crate::types::{DataType, Key, Value};

/// Key holding the controller's own count of published keys.
pub const KEY_COUNT: Key = Key::from_raw(u32::from_be_bytes(*b"#KEY"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Size mismatch for key {key}: controller expects {expected} bytes, got {actual}")]
    SizeMismatch {
        key: Key,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Read one key: its type, size and payload.
///
/// A value of size 0 means the controller holds no data for the key. That is
/// not an error.
pub fn read_key<T: Transport>(session: &mut Session<T>, key: Key) -> Result<Value, ProtocolError> {
    let info = session.call(SMC_SELECTOR, &KeyData::read_key_info(key.raw()))?;
    let data_size = info.key_info.data_size;
    let data_type = DataType::from_tag(info.key_info.data_type);
    debug!(%key, data_size, %data_type, "key info");

    let out = session.call(SMC_SELECTOR, &KeyData::read_bytes(key.raw(), data_size))?;
    let len = usize::try_from(data_size).unwrap_or(usize::MAX);
    if len > codec::PAYLOAD_CAPACITY {
        return Err(CodecError::PayloadTooLarge(len).into());
    }
    Ok(Value::new(key, data_type, &out.bytes[..len])?)
}

/// Write a value whose size must match the key's registered size.
pub fn write_key<T: Transport>(session: &mut Session<T>, value: &Value) -> Result<(), ProtocolError> {
    let current = read_key(session, value.key)?;
    if current.size() != value.size() {
        return Err(ProtocolError::SizeMismatch {
            key: value.key,
            expected: current.size(),
            actual: value.size(),
        });
    }

    let request = KeyData::write_bytes(value.key.raw(), value.size() as u32, *value.raw_buffer());
    session.call(SMC_SELECTOR, &request)?;

    debug!(key = %value.key, size = value.size(), "key written");
    logger::log_event(
        "smc_write",
        json!({
            "key": value.key.to_string(),
            "type": current.data_type.to_string(),
            "size": value.size(),
            "previous": codec::hex_string(current.bytes()),
            "written": codec::hex_string(value.bytes()),
        }),
    );
    Ok(())
}

/// Number of keys the controller publishes, or 0 if `#KEY` cannot be read.
pub fn read_index_count<T: Transport>(session: &mut Session<T>) -> u32 {
    match read_key(session, KEY_COUNT) {
        Ok(value) => codec::decode_unsigned(value.bytes()),
        Err(e) => {
            debug!("#KEY read failed: {}", e);
            0
        }
    }
}
