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

//! Keys, data type tags and decoded values.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::codec::{self, CodecError, PAYLOAD_CAPACITY};

/// A controller key: up to four printable ASCII characters, held in its
/// packed big-endian wire form.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(u32);

impl Key {
    pub fn new(name: &str) -> Result<Self, CodecError> {
        if name.is_empty() || name.len() > 4 || !name.bytes().all(|b| (0x20..0x7f).contains(&b)) {
            return Err(CodecError::InvalidKey(name.to_string()));
        }
        Ok(Key(codec::pack_key(name.as_bytes())))
    }

    pub const fn from_raw(raw: u32) -> Self {
        Key(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Substitute a fan index into a template such as `F{}Ac`.
    pub fn for_fan(template: &str, index: u8) -> Result<Self, CodecError> {
        Key::new(&template.replacen("{}", &index.to_string(), 1))
    }
}

impl FromStr for Key {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Key::new(s)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&codec::unpack_key(self.0))
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Payload encoding announced by the controller for a key.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DataType {
    UInt8,
    UInt16,
    UInt32,
    /// Unsigned fixed point, 2 fraction bits. Fan speeds.
    Fpe2,
    /// Signed fixed point, 7 integer and 8 fraction bits. Temperatures.
    Sp78,
    Unknown(Key),
}

const TAG_UI8: u32 = codec_tag(b"ui8 ");
const TAG_UI16: u32 = codec_tag(b"ui16");
const TAG_UI32: u32 = codec_tag(b"ui32");
const TAG_FPE2: u32 = codec_tag(b"fpe2");
const TAG_SP78: u32 = codec_tag(b"sp78");

const fn codec_tag(tag: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*tag)
}

impl DataType {
    pub fn from_tag(tag: u32) -> Self {
        match tag {
            TAG_UI8 => DataType::UInt8,
            TAG_UI16 => DataType::UInt16,
            TAG_UI32 => DataType::UInt32,
            TAG_FPE2 => DataType::Fpe2,
            TAG_SP78 => DataType::Sp78,
            other => DataType::Unknown(Key::from_raw(other)),
        }
    }

    pub fn tag(self) -> u32 {
        match self {
            DataType::UInt8 => TAG_UI8,
            DataType::UInt16 => TAG_UI16,
            DataType::UInt32 => TAG_UI32,
            DataType::Fpe2 => TAG_FPE2,
            DataType::Sp78 => TAG_SP78,
            DataType::Unknown(key) => key.raw(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&codec::unpack_key(self.tag()))
    }
}

impl Serialize for DataType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// A payload interpreted according to its data type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Decoded {
    Unsigned(u32),
    Rpm(f32),
    Celsius(f64),
    Raw,
    Empty,
}

/// One key's value as read from, or about to be written to, the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub key: Key,
    pub data_type: DataType,
    size: usize,
    bytes: [u8; PAYLOAD_CAPACITY],
}

impl Value {
    pub fn new(key: Key, data_type: DataType, payload: &[u8]) -> Result<Self, CodecError> {
        if payload.len() > PAYLOAD_CAPACITY {
            return Err(CodecError::PayloadTooLarge(payload.len()));
        }
        let mut bytes = [0u8; PAYLOAD_CAPACITY];
        bytes[..payload.len()].copy_from_slice(payload);
        Ok(Value { key, data_type, size: payload.len(), bytes })
    }

    /// A value with no data, as returned for keys the controller does not hold.
    pub fn empty(key: Key, data_type: DataType) -> Self {
        Value { key, data_type, size: 0, bytes: [0u8; PAYLOAD_CAPACITY] }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The meaningful part of the payload.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.size]
    }

    /// The whole zero-padded buffer as sent on the wire.
    pub fn raw_buffer(&self) -> &[u8; PAYLOAD_CAPACITY] {
        &self.bytes
    }

    pub fn decode(&self) -> Decoded {
        if self.is_empty() {
            return Decoded::Empty;
        }
        match self.data_type {
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 => {
                Decoded::Unsigned(codec::decode_unsigned(self.bytes()))
            }
            DataType::Fpe2 => Decoded::Rpm(codec::decode_fixed_fraction(self.bytes(), 2)),
            DataType::Sp78 if self.size >= 2 => {
                Decoded::Celsius(codec::decode_temperature(self.bytes[0], self.bytes[1]))
            }
            DataType::Sp78 | DataType::Unknown(_) => Decoded::Raw,
        }
    }
}

impl fmt::Display for Value {
    /// `  KEY   [type]  decoded (bytes xx xx)`, or `no data`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {:<4}  [{:<4}]  ", self.key, self.data_type)?;
        if self.is_empty() {
            return write!(f, "no data");
        }
        match self.decode() {
            Decoded::Unsigned(v) => write!(f, "{} ", v)?,
            Decoded::Rpm(v) => write!(f, "{:.0} ", v)?,
            Decoded::Celsius(v) => write!(f, "{:.2} ", v)?,
            Decoded::Raw | Decoded::Empty => {}
        }
        write!(f, "(bytes")?;
        for b in self.bytes() {
            write!(f, " {:02x}", b)?;
        }
        write!(f, ")")
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Value", 5)?;
        s.serialize_field("key", &self.key)?;
        s.serialize_field("type", &self.data_type)?;
        s.serialize_field("size", &self.size)?;
        s.serialize_field("bytes", &codec::hex_string(self.bytes()))?;
        s.serialize_field("decoded", &self.decode())?;
        s.end()
    }
}
