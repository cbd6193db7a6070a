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

//! Byte-level conversions for SMC keys and payloads.
//!
//! Keys and data type tags travel as big-endian packed `u32`s. Payloads use
//! one of three encodings in practice:
//!
//! - `ui8 ` / `ui16` / `ui32`: big-endian unsigned integers
//! - `fpe2`: unsigned fixed point with 2 fraction bits (fan speeds)
//! - `sp78`: signed 7.8 fixed point (temperatures)

use thiserror::Error;

/// Largest payload the controller transfers in one call.
pub const PAYLOAD_CAPACITY: usize = 32;

/// Largest RPM that still fits the 14 integer bits of an `fpe2` word.
pub const MAX_FAN_RPM: u32 = 0x3fff;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Malformed hex input: {0}")]
    MalformedHexInput(String),
    #[error("Invalid key '{0}': expected 1-4 printable ASCII characters")]
    InvalidKey(String),
    #[error("Payload too large: {0} bytes (max 32)")]
    PayloadTooLarge(usize),
    #[error("Fan speed {0} rpm out of range (max 16383)")]
    RpmOutOfRange(u32),
}

/// Pack up to four bytes big-endian. Shorter inputs are left-padded with zero.
pub fn pack_key(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

/// Four characters, most significant byte first. Each byte maps to the
/// `char` of the same code point, so bytes above 0x7f stay one character.
pub fn unpack_key(value: u32) -> String {
    value.to_be_bytes().iter().map(|&b| char::from(b)).collect()
}

/// Inverse of [`unpack_key`]: pack text one `char` per byte.
///
/// Characters above U+00FF cannot come out of `unpack_key` and pack as zero.
pub fn pack_key_str(text: &str) -> u32 {
    let bytes: Vec<u8> = text
        .chars()
        .take(4)
        .map(|c| u8::try_from(c).unwrap_or(0))
        .collect();
    pack_key(&bytes)
}

/// Big-endian unsigned reconstruction, used for sizes 1, 2 and 4.
pub fn decode_unsigned(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |acc, &b| acc.wrapping_shl(8) | u32::from(b))
}

/// Generic fixed-point decode.
///
/// Every byte but the last is shifted by `(8 - fraction_bits)` per position;
/// the last byte contributes only `byte >> fraction_bits`. The low
/// `fraction_bits` of the final byte are therefore dropped, so `fpe2` values
/// come back as whole RPM. Callers rely on this exact rounding.
pub fn decode_fixed_fraction(bytes: &[u8], fraction_bits: u32) -> f32 {
    let size = bytes.len();
    let step = 8u32.saturating_sub(fraction_bits);
    let mut total = 0f32;
    for (i, &b) in bytes.iter().enumerate() {
        if i == size - 1 {
            total += (u32::from(b) >> fraction_bits) as f32;
        } else {
            let shift = (size - 1 - i) as u32 * step;
            total += u32::from(b).wrapping_shl(shift) as f32;
        }
    }
    total
}

/// `sp78` temperature in degrees Celsius.
pub fn decode_temperature(b0: u8, b1: u8) -> f64 {
    let raw = i16::from_be_bytes([b0, b1]) >> 2;
    f64::from(raw) / 64.0
}

/// Encode a target RPM as an `fpe2` word.
pub fn encode_fan_rpm(rpm: u32) -> Result<[u8; 2], CodecError> {
    if rpm > MAX_FAN_RPM {
        return Err(CodecError::RpmOutOfRange(rpm));
    }
    let v = rpm << 2;
    Ok([(v / 256) as u8, (v % 256) as u8])
}

/// Parse a string of hex pairs ("1a2b") into raw bytes.
pub fn encode_hex_pairs(input: &str) -> Result<Vec<u8>, CodecError> {
    if input.len() % 2 != 0 {
        return Err(CodecError::MalformedHexInput(format!(
            "odd number of hex digits ({})",
            input.len()
        )));
    }
    // from_str_radix alone would accept a leading '+'
    if let Some(bad) = input.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(CodecError::MalformedHexInput(format!("'{}' is not a hex digit", bad)));
    }
    let bytes = input
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            let s = std::str::from_utf8(pair)
                .map_err(|_| CodecError::MalformedHexInput(input.to_string()))?;
            u8::from_str_radix(s, 16)
                .map_err(|_| CodecError::MalformedHexInput(format!("'{}' is not a hex pair", s)))
        })
        .collect::<Result<Vec<u8>, CodecError>>()?;
    if bytes.len() > PAYLOAD_CAPACITY {
        return Err(CodecError::PayloadTooLarge(bytes.len()));
    }
    Ok(bytes)
}

/// Lowercase hex with no separators, the inverse of [`encode_hex_pairs`].
pub fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_key_four_chars() {
        assert_eq!(pack_key(b"#KEY"), 0x234b_4559);
        assert_eq!(pack_key(b"TC0P"), 0x5443_3050);
    }

    #[test]
    fn test_pack_key_short_is_left_padded() {
        assert_eq!(pack_key(b"ab"), 0x0000_6162);
        assert_eq!(pack_key(b""), 0);
    }

    #[test]
    fn test_unpack_key() {
        assert_eq!(unpack_key(0x234b_4559), "#KEY");
        assert_eq!(unpack_key(pack_key(b"FS! ")), "FS! ");
    }

    #[test]
    fn test_pack_unpack_inverse_on_sampled_words() {
        for x in [0u32, 1, 0x7f7f_7f7f, 0x8000_0000, 0xdead_beef, u32::MAX] {
            assert_eq!(pack_key_str(&unpack_key(x)), x);
        }
    }

    #[test]
    fn test_unpack_key_high_bytes_one_char_each() {
        let text = unpack_key(0xdead_beef);
        assert_eq!(text.chars().count(), 4);
        assert_eq!(text, "\u{de}\u{ad}\u{be}\u{ef}");
        assert_eq!(pack_key_str(&text), 0xdead_beef);
    }

    #[test]
    fn test_pack_key_str_matches_pack_key_on_ascii() {
        for name in ["#KEY", "FS! ", "ab"] {
            assert_eq!(pack_key_str(name), pack_key(name.as_bytes()));
        }
    }

    #[test]
    fn test_decode_unsigned() {
        assert_eq!(decode_unsigned(&[0x2a]), 42);
        assert_eq!(decode_unsigned(&[0x01, 0x00]), 256);
        assert_eq!(decode_unsigned(&[0, 0, 0, 12]), 12);
        assert_eq!(decode_unsigned(&[0x12, 0x34, 0x56, 0x78]), 0x1234_5678);
        assert_eq!(decode_unsigned(&[]), 0);
    }

    #[test]
    fn test_decode_temperature() {
        assert_eq!(decode_temperature(0x19, 0x00), 25.0);
        assert_eq!(decode_temperature(0x3a, 0x80), 58.5);
        assert_eq!(decode_temperature(0x00, 0x00), 0.0);
    }

    #[test]
    fn test_decode_temperature_negative() {
        // 0xfb00 is -5.0 in sp78
        assert_eq!(decode_temperature(0xfb, 0x00), -5.0);
    }

    #[test]
    fn test_encode_fan_rpm() {
        assert_eq!(encode_fan_rpm(1200).unwrap(), [18, 192]);
        assert_eq!(encode_fan_rpm(0).unwrap(), [0, 0]);
        assert_eq!(encode_fan_rpm(MAX_FAN_RPM).unwrap(), [0xff, 0xfc]);
    }

    #[test]
    fn test_encode_fan_rpm_out_of_range() {
        assert_eq!(
            encode_fan_rpm(MAX_FAN_RPM + 1),
            Err(CodecError::RpmOutOfRange(MAX_FAN_RPM + 1))
        );
    }

    #[test]
    fn test_fpe2_decode_recovers_encoded_rpm() {
        let bytes = encode_fan_rpm(1200).unwrap();
        assert_eq!(decode_fixed_fraction(&bytes, 2), 1200.0);
    }

    #[test]
    fn test_fpe2_drops_fraction_bits() {
        // 0x12c3 = 1200.75 in exact fpe2; the low bits are discarded
        assert_eq!(decode_fixed_fraction(&[0x12, 0xc3], 2), 1200.0);
    }

    #[test]
    fn test_encode_hex_pairs() {
        assert_eq!(encode_hex_pairs("1a2b").unwrap(), vec![0x1a, 0x2b]);
        assert_eq!(encode_hex_pairs("FF00").unwrap(), vec![0xff, 0x00]);
        assert!(encode_hex_pairs("").unwrap().is_empty());
    }

    #[test]
    fn test_encode_hex_pairs_malformed() {
        assert!(matches!(encode_hex_pairs("1a2"), Err(CodecError::MalformedHexInput(_))));
        assert!(matches!(encode_hex_pairs("zz"), Err(CodecError::MalformedHexInput(_))));
        assert!(matches!(encode_hex_pairs("+1"), Err(CodecError::MalformedHexInput(_))));
        assert!(matches!(encode_hex_pairs("é00"), Err(CodecError::MalformedHexInput(_))));
    }

    #[test]
    fn test_encode_hex_pairs_too_large() {
        let input = "00".repeat(PAYLOAD_CAPACITY + 1);
        assert_eq!(
            encode_hex_pairs(&input),
            Err(CodecError::PayloadTooLarge(PAYLOAD_CAPACITY + 1))
        );
    }

    #[test]
    fn test_hex_string() {
        assert_eq!(hex_string(&[0x1a, 0x2b, 0x00]), "1a2b00");
    }

    #[test]
    fn test_codec_error_display() {
        let err = CodecError::InvalidKey("TOOLONG".to_string());
        assert_eq!(
            format!("{}", err),
            "Invalid key 'TOOLONG': expected 1-4 printable ASCII characters"
        );
        assert_eq!(
            format!("{}", CodecError::PayloadTooLarge(40)),
            "Payload too large: 40 bytes (max 32)"
        );
    }
}
