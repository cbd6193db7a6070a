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

//! Decoded temperature and fan readers.
//!
//! # Unavailable readings
//!
//! The single-value readers never fail. A read error, a zero-size value or an
//! unexpected data type all map to a sentinel:
//! - temperature: `0.0`
//! - fan RPM: `-1`

use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::codec;
use crate::logger;
use crate::protocol::{read_key, write_key, ProtocolError};
use crate::sensors::TempSensor;
use crate::transport::{Session, Transport};
use crate::types::{DataType, Key, Value};

pub const KEY_FAN_COUNT: &str = "FNum";
pub const KEY_FAN_FORCE_MASK: &str = "FS! ";
pub const KEY_FAN_ACTUAL: &str = "F{}Ac";
pub const KEY_FAN_MIN: &str = "F{}Mn";
pub const KEY_FAN_MAX: &str = "F{}Mx";
pub const KEY_FAN_SAFE: &str = "F{}Sf";
pub const KEY_FAN_TARGET: &str = "F{}Tg";

/// Temperature in degrees Celsius, or `0.0` when unavailable.
pub fn get_temperature<T: Transport>(session: &mut Session<T>, key: Key) -> f64 {
    match read_key(session, key) {
        Ok(v) if v.data_type == DataType::Sp78 && v.size() >= 2 => {
            codec::decode_temperature(v.bytes()[0], v.bytes()[1])
        }
        Ok(v) => {
            debug!(%key, data_type = %v.data_type, size = v.size(), "not a temperature");
            0.0
        }
        Err(e) => {
            debug!(%key, "temperature read failed: {}", e);
            0.0
        }
    }
}

/// Fan speed in RPM, or `-1` when unavailable.
pub fn get_fan_rpm<T: Transport>(session: &mut Session<T>, key: Key) -> i32 {
    match read_key(session, key) {
        Ok(v) if v.data_type == DataType::Fpe2 && v.size() > 0 => {
            codec::decode_fixed_fraction(v.bytes(), 2) as i32
        }
        Ok(_) => -1,
        Err(e) => {
            debug!(%key, "fan read failed: {}", e);
            -1
        }
    }
}

/// Write a target RPM to an `fpe2` key such as `F0Mn`.
pub fn set_fan_rpm<T: Transport>(session: &mut Session<T>, key: Key, rpm: u32) -> Result<(), ProtocolError> {
    let bytes = codec::encode_fan_rpm(rpm)?;
    let value = Value::new(key, DataType::Fpe2, &bytes)?;
    write_key(session, &value)?;
    logger::log_event("fan_rpm_set", json!({ "key": key.to_string(), "rpm": rpm }));
    Ok(())
}

/// Number of fans the controller reports.
pub fn fan_count<T: Transport>(session: &mut Session<T>) -> Result<u32, ProtocolError> {
    let value = read_key(session, Key::new(KEY_FAN_COUNT)?)?;
    Ok(codec::decode_unsigned(value.bytes()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FanMode {
    Auto,
    Forced,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FanStatus {
    pub index: u8,
    pub actual: f32,
    pub minimum: f32,
    pub maximum: f32,
    pub safe: f32,
    pub target: f32,
    pub mode: FanMode,
}

fn read_fan_speed<T: Transport>(session: &mut Session<T>, template: &str, index: u8) -> Result<f32, ProtocolError> {
    let value = read_key(session, Key::for_fan(template, index)?)?;
    Ok(codec::decode_fixed_fraction(value.bytes(), 2))
}

/// Mode of fan `index` according to the force bitmask.
pub fn fan_mode(mask: u32, index: u8) -> FanMode {
    if index < 32 && mask & (1 << index) != 0 {
        FanMode::Forced
    } else {
        FanMode::Auto
    }
}

/// Speeds and mode of one fan.
pub fn fan_status<T: Transport>(session: &mut Session<T>, index: u8) -> Result<FanStatus, ProtocolError> {
    let actual = read_fan_speed(session, KEY_FAN_ACTUAL, index)?;
    let minimum = read_fan_speed(session, KEY_FAN_MIN, index)?;
    let maximum = read_fan_speed(session, KEY_FAN_MAX, index)?;
    let safe = read_fan_speed(session, KEY_FAN_SAFE, index)?;
    let target = read_fan_speed(session, KEY_FAN_TARGET, index)?;

    let mask_value = read_key(session, Key::new(KEY_FAN_FORCE_MASK)?)?;
    let mask_bytes = mask_value.bytes();
    let mask = codec::decode_unsigned(&mask_bytes[..mask_bytes.len().min(2)]);

    Ok(FanStatus {
        index,
        actual,
        minimum,
        maximum,
        safe,
        target,
        mode: fan_mode(mask, index),
    })
}

/// Status of every fan the controller reports.
pub fn all_fans<T: Transport>(session: &mut Session<T>) -> Result<Vec<FanStatus>, ProtocolError> {
    // Fan keys carry a single index digit in practice
    let count = fan_count(session)?.min(u32::from(u8::MAX)) as u8;
    (0..count).map(|i| fan_status(session, i)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureReading {
    pub name: String,
    pub key: String,
    pub celsius: f64,
}

/// Read every sensor in `sensors`, keeping readings above zero.
pub fn temperature_report<T: Transport>(session: &mut Session<T>, sensors: &[TempSensor]) -> Vec<TemperatureReading> {
    let mut out = Vec::new();
    for sensor in sensors {
        let key = match Key::new(&sensor.key) {
            Ok(k) => k,
            Err(e) => {
                debug!("skipping sensor {}: {}", sensor.name, e);
                continue;
            }
        };
        let celsius = get_temperature(session, key);
        if celsius > 0.0 {
            out.push(TemperatureReading {
                name: sensor.name.clone(),
                key: sensor.key.clone(),
                celsius,
            });
        }
    }
    out
}
