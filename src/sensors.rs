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

//! Friendly names for well-known temperature keys.

use serde::{Deserialize, Serialize};

/// (display name, key)
pub const TEMPERATURE_SENSORS: &[(&str, &str)] = &[
    ("Mem Controller", "Tm0P"),
    ("Mem Bank A1", "TM0P"),
    ("Mem Bank A2", "TM1P"),
    ("Mem Bank A3", "TM2P"),
    ("Mem Bank A4", "TM3P"),
    ("Mem Bank A5", "TM4P"),
    ("Mem Bank A6", "TM5P"),
    ("Mem Bank A7", "TM6P"),
    ("Mem Bank A8", "TM7P"),
    ("Mem Bank B1", "TM8P"),
    ("Mem Bank B2", "TM9P"),
    ("Mem Bank B3", "TMAP"),
    ("Mem Bank B4", "TMBP"),
    ("Mem Bank B5", "TMCP"),
    ("Mem Bank B6", "TMDP"),
    ("Mem Bank B7", "TMEP"),
    ("Mem Bank B8", "TMFP"),
    ("Mem module A1", "TM0S"),
    ("Mem module A2", "TM1S"),
    ("Mem module A3", "TM2S"),
    ("Mem module A4", "TM3S"),
    ("Mem module A5", "TM4S"),
    ("Mem module A6", "TM5S"),
    ("Mem module A7", "TM6S"),
    ("Mem module A8", "TM7S"),
    ("Mem module B1", "TM8S"),
    ("Mem module B2", "TM9S"),
    ("Mem module B3", "TMAS"),
    ("Mem module B4", "TMBS"),
    ("Mem module B5", "TMCS"),
    ("Mem module B6", "TMDS"),
    ("Mem module B7", "TMES"),
    ("Mem module B8", "TMFS"),
    ("CPU A", "TC0H"),
    ("CPU A", "TC0D"),
    ("CPU B", "TC1D"),
    ("CPU C", "TC2D"),
    ("CPU D", "TC3D"),
    ("CPU A", "TCAH"),
    ("CPU B", "TCBH"),
    ("CPU C", "TCCH"),
    ("CPU D", "TCDH"),
    ("GPU", "TG0P"),
    ("Ambient", "TA0P"),
    ("HD Bay 1", "TA0P"),
    ("HD Bay 2", "TH1P"),
    ("HD Bay 3", "TH2P"),
    ("HD Bay 4", "TH3P"),
    ("Optical Drive", "TO0P"),
    ("Heatsink A", "Th0H"),
    ("Heatsink B", "Th1H"),
    ("Heatsink C", "Th2H"),
    ("GPU Diode", "TG0D"),
    ("GPU Heatsink", "TG0H"),
    ("GPU Heatsink 2", "TG1H"),
    ("Power supply 2", "Tp1C"),
    ("Power supply 1", "Tp0C"),
    ("Power supply 1", "Tp0P"),
    ("Enclosure Base", "TB0T"),
    ("Enclosure Base 2", "TB1T"),
    ("Enclosure Base 3", "TB2T"),
    ("Enclosure Base 4", "TB3T"),
    ("Northbridge 1", "TN0P"),
    ("Northbridge 2", "TN1P"),
    ("Northbridge", "TN0H"),
    ("Expansion Slots", "TS0C"),
    ("Airport Card", "TW0P"),
    ("PCI Slot 1 Pos 1", "TA0S"),
    ("PCI Slot 1 Pos 2", "TA1S"),
    ("PCI Slot 2 Pos 1", "TA2S"),
    ("PCI Slot 2 Pos 2", "TA3S"),
    ("Ambient 2", "TA1P"),
    ("Power supply 2", "Tp1P"),
    ("Power supply 3", "Tp2P"),
    ("Power supply 4", "Tp3P"),
    ("Power supply 5", "Tp4P"),
    ("Power supply 6", "Tp5P"),
];

/// Keys probed alongside the fan report.
pub const FAN_REPORT_PROBES: &[&str] = &[
    "TC0P", "TB0T", "TC0D", "TM0P", "TN0P", "Th0H", "Ts0P", "TN1P", "Th1H",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempSensor {
    pub name: String,
    pub key: String,
}

/// The built-in table followed by `extra`.
pub fn sensor_table(extra: &[TempSensor]) -> Vec<TempSensor> {
    TEMPERATURE_SENSORS
        .iter()
        .map(|(name, key)| TempSensor { name: name.to_string(), key: key.to_string() })
        .chain(extra.iter().cloned())
        .collect()
}
