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

//! In-memory controller.
//!
//! Answers the same four commands as the hardware from a key table, so the
//! protocol, enumeration and readers can run without an SMC. Failures can be
//! injected per index position, per key, or for every call.

use std::collections::HashSet;

use super::{
    KeyData, KeyInfo, Transport, TransportError, CMD_READ_BYTES, CMD_READ_INDEX,
    CMD_READ_KEYINFO, CMD_WRITE_BYTES,
};
use crate::codec::{self, PAYLOAD_CAPACITY};
use crate::types::{DataType, Key};

/// Result byte the controller reports for an unknown key.
pub const RESULT_KEY_NOT_FOUND: u8 = 0x84;

/// `kIOReturnError`, used for injected call failures.
pub const IO_RETURN_ERROR: u32 = 0xe000_02bc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimKey {
    pub key: Key,
    pub data_type: DataType,
    pub bytes: Vec<u8>,
}

/// One served command, recorded for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimCall {
    pub command: u8,
    pub key: u32,
    pub index: u32,
}

#[derive(Debug, Default, Clone)]
pub struct SimulatedController {
    keys: Vec<SimKey>,
    failing_positions: HashSet<u32>,
    failing_keys: HashSet<Key>,
    fail_all: bool,
    log: Vec<SimCall>,
}

impl SimulatedController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a key. Keys are indexed in insertion order.
    pub fn with_key(mut self, name: &str, data_type: DataType, bytes: &[u8]) -> Self {
        self.insert(name, data_type, bytes);
        self
    }

    pub fn insert(&mut self, name: &str, data_type: DataType, bytes: &[u8]) {
        let key = match Key::new(name) {
            Ok(k) => k,
            Err(_) => return,
        };
        let entry = SimKey { key, data_type, bytes: bytes.to_vec() };
        match self.keys.iter_mut().find(|k| k.key == key) {
            Some(existing) => *existing = entry,
            None => self.keys.push(entry),
        }
    }

    /// Make the read-index command fail at `position`.
    pub fn fail_position(mut self, position: u32) -> Self {
        self.failing_positions.insert(position);
        self
    }

    /// Make every command addressed to `name` fail.
    pub fn fail_key(mut self, name: &str) -> Self {
        if let Ok(key) = Key::new(name) {
            self.failing_keys.insert(key);
        }
        self
    }

    /// Make every command fail.
    pub fn fail_all(mut self) -> Self {
        self.fail_all = true;
        self
    }

    pub fn get(&self, name: &str) -> Option<&SimKey> {
        let key = Key::new(name).ok()?;
        self.keys.iter().find(|k| k.key == key)
    }

    pub fn keys(&self) -> &[SimKey] {
        &self.keys
    }

    pub fn calls(&self) -> &[SimCall] {
        &self.log
    }

    pub fn writes(&self) -> impl Iterator<Item = &SimCall> {
        self.log.iter().filter(|c| c.command == CMD_WRITE_BYTES)
    }

    /// A two-fan notebook profile with a handful of temperature sensors.
    pub fn demo() -> Self {
        let mut sim = SimulatedController::new()
            .with_key("FNum", DataType::UInt8, &[2])
            .with_key("FS! ", DataType::UInt16, &[0x00, 0x02])
            .with_key("F0Ac", DataType::Fpe2, &[0x1f, 0x40])
            .with_key("F0Mn", DataType::Fpe2, &[0x12, 0xc0])
            .with_key("F0Mx", DataType::Fpe2, &[0x5d, 0xc0])
            .with_key("F0Sf", DataType::Fpe2, &[0x00, 0x00])
            .with_key("F0Tg", DataType::Fpe2, &[0x1f, 0x40])
            .with_key("F1Ac", DataType::Fpe2, &[0x2e, 0xe0])
            .with_key("F1Mn", DataType::Fpe2, &[0x12, 0xc0])
            .with_key("F1Mx", DataType::Fpe2, &[0x5d, 0xc0])
            .with_key("F1Sf", DataType::Fpe2, &[0x00, 0x00])
            .with_key("F1Tg", DataType::Fpe2, &[0x2e, 0xe0])
            .with_key("TC0P", DataType::Sp78, &[0x3a, 0x80])
            .with_key("TC0D", DataType::Sp78, &[0x3e, 0x40])
            .with_key("TG0P", DataType::Sp78, &[0x35, 0x00])
            .with_key("TB0T", DataType::Sp78, &[0x1e, 0xc0])
            .with_key("Th0H", DataType::Sp78, &[0x30, 0x00])
            .with_key("TN0P", DataType::Sp78, &[0x33, 0x40])
            .with_key("TA0P", DataType::Sp78, &[0x1c, 0x00])
            .with_key("MSAc", DataType::from_tag(codec::pack_key(b"flag")), &[0x01]);
        let count = sim.keys.len() as u32 + 1;
        sim.keys.insert(
            0,
            SimKey {
                key: Key::from_raw(codec::pack_key(b"#KEY")),
                data_type: DataType::UInt32,
                bytes: count.to_be_bytes().to_vec(),
            },
        );
        sim
    }

    fn lookup(&self, raw: u32) -> Option<&SimKey> {
        self.keys.iter().find(|k| k.key.raw() == raw)
    }
}

impl Transport for SimulatedController {
    fn call(&mut self, _selector: u32, input: &KeyData) -> Result<KeyData, TransportError> {
        self.log.push(SimCall { command: input.command, key: input.key, index: input.index });

        if self.fail_all || self.failing_keys.contains(&Key::from_raw(input.key)) {
            return Err(TransportError::CallFailed(IO_RETURN_ERROR));
        }

        let mut out = KeyData { key: input.key, ..Default::default() };
        match input.command {
            CMD_READ_KEYINFO => match self.lookup(input.key) {
                Some(entry) => {
                    out.key_info = KeyInfo {
                        data_size: entry.bytes.len() as u32,
                        data_type: entry.data_type.tag(),
                        attributes: 0,
                    };
                }
                None => out.result = RESULT_KEY_NOT_FOUND,
            },
            CMD_READ_BYTES => match self.lookup(input.key) {
                Some(entry) => {
                    let n = (input.key_info.data_size as usize)
                        .min(entry.bytes.len())
                        .min(PAYLOAD_CAPACITY);
                    out.bytes[..n].copy_from_slice(&entry.bytes[..n]);
                }
                None => out.result = RESULT_KEY_NOT_FOUND,
            },
            CMD_WRITE_BYTES => {
                let size = input.key_info.data_size as usize;
                match self.keys.iter_mut().find(|k| k.key.raw() == input.key) {
                    Some(entry) if entry.bytes.len() == size && size <= PAYLOAD_CAPACITY => {
                        entry.bytes.copy_from_slice(&input.bytes[..size]);
                    }
                    _ => out.result = RESULT_KEY_NOT_FOUND,
                }
            }
            CMD_READ_INDEX => {
                if self.failing_positions.contains(&input.index) {
                    return Err(TransportError::CallFailed(IO_RETURN_ERROR));
                }
                // Past the end of the table the controller hands back key 0
                out.key = self
                    .keys
                    .get(input.index as usize)
                    .map(|k| k.key.raw())
                    .unwrap_or(0);
            }
            _ => return Err(TransportError::CallFailed(IO_RETURN_ERROR)),
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::SMC_SELECTOR;

    fn key(name: &str) -> u32 {
        codec::pack_key(name.as_bytes())
    }

    #[test]
    fn test_key_info_and_bytes() {
        let mut sim = SimulatedController::new().with_key("TC0P", DataType::Sp78, &[0x19, 0x00]);
        let info = sim.call(SMC_SELECTOR, &KeyData::read_key_info(key("TC0P"))).unwrap();
        assert_eq!(info.key_info.data_size, 2);
        assert_eq!(DataType::from_tag(info.key_info.data_type), DataType::Sp78);

        let read = sim.call(SMC_SELECTOR, &KeyData::read_bytes(key("TC0P"), 2)).unwrap();
        assert_eq!(&read.bytes[..2], &[0x19, 0x00]);
        assert_eq!(sim.calls().len(), 2);
    }

    #[test]
    fn test_unknown_key_reports_not_found() {
        let mut sim = SimulatedController::new();
        let info = sim.call(SMC_SELECTOR, &KeyData::read_key_info(key("NOPE"))).unwrap();
        assert_eq!(info.result, RESULT_KEY_NOT_FOUND);
        assert_eq!(info.key_info.data_size, 0);
    }

    #[test]
    fn test_write_bytes_updates_table() {
        let mut sim = SimulatedController::new().with_key("F0Mn", DataType::Fpe2, &[0, 0]);
        let mut payload = [0u8; PAYLOAD_CAPACITY];
        payload[..2].copy_from_slice(&[18, 192]);
        sim.call(SMC_SELECTOR, &KeyData::write_bytes(key("F0Mn"), 2, payload)).unwrap();
        assert_eq!(sim.get("F0Mn").unwrap().bytes, vec![18, 192]);
        assert_eq!(sim.writes().count(), 1);
    }

    #[test]
    fn test_read_index_past_end_is_zero_key() {
        let mut sim = SimulatedController::new().with_key("AAAA", DataType::UInt8, &[1]);
        let first = sim.call(SMC_SELECTOR, &KeyData::read_index(0)).unwrap();
        assert_eq!(first.key, key("AAAA"));
        let past = sim.call(SMC_SELECTOR, &KeyData::read_index(1)).unwrap();
        assert_eq!(past.key, 0);
    }

    #[test]
    fn test_injected_failures() {
        let mut sim = SimulatedController::new()
            .with_key("AAAA", DataType::UInt8, &[1])
            .fail_position(0)
            .fail_key("AAAA");
        assert_eq!(
            sim.call(SMC_SELECTOR, &KeyData::read_index(0)),
            Err(TransportError::CallFailed(IO_RETURN_ERROR))
        );
        assert!(sim.call(SMC_SELECTOR, &KeyData::read_key_info(key("AAAA"))).is_err());

        let mut dead = SimulatedController::new().fail_all();
        assert!(dead.call(SMC_SELECTOR, &KeyData::read_index(3)).is_err());
    }

    #[test]
    fn test_insert_replaces_existing() {
        let mut sim = SimulatedController::new().with_key("AAAA", DataType::UInt8, &[1]);
        sim.insert("AAAA", DataType::UInt16, &[0, 2]);
        assert_eq!(sim.keys().len(), 1);
        assert_eq!(sim.get("AAAA").unwrap().data_type, DataType::UInt16);
    }

    #[test]
    fn test_demo_profile_counts_itself() {
        let sim = SimulatedController::demo();
        let count = sim.get("#KEY").unwrap();
        assert_eq!(codec::decode_unsigned(&count.bytes) as usize, sim.keys().len());
        assert_eq!(sim.keys()[0].key.to_string(), "#KEY");
    }
}
