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

//! One-shot command implementations.
//!
//! Output goes to any `Write` so the commands can run against a buffer.

use std::io::Write;

use anyhow::{bail, Context};
use serde_json::json;

use crate::cli::Command;
use crate::codec;
use crate::config::SavedConfig;
use crate::enumerate::list_all_keys_with;
use crate::protocol::{read_index_count, read_key, write_key};
use crate::readers::{all_fans, fan_count, get_temperature, set_fan_rpm, temperature_report, FanMode};
use crate::sensors::{sensor_table, FAN_REPORT_PROBES};
use crate::transport::{Session, Transport};
use crate::types::{Key, Value};

/// Refuse write commands unless running as root or simulated.
pub fn require_root(cmd: &Command, simulated: bool) -> anyhow::Result<()> {
    if !cmd.is_write() || simulated {
        return Ok(());
    }
    if unsafe { libc::geteuid() } != 0 {
        bail!("writing SMC keys requires root privileges; run with sudo");
    }
    Ok(())
}

pub fn run_command<T: Transport, W: Write>(
    cmd: &Command,
    session: &mut Session<T>,
    cfg: &SavedConfig,
    json: bool,
    out: &mut W,
) -> anyhow::Result<()> {
    match cmd {
        Command::List => list(session, cfg, json, out),
        Command::Read { key } => read(session, *key, json, out),
        Command::Write { key, hex } => write(session, *key, hex, out),
        Command::Fans => fans(session, json, out),
        Command::Temps => temps(session, cfg, json, out),
        Command::Count => {
            let n = read_index_count(session);
            if json {
                writeln!(out, "{}", json!({ "total": n }))?;
            } else {
                writeln!(out, "{}", n)?;
            }
            Ok(())
        }
        Command::SetRpm { key, rpm } => {
            set_fan_rpm(session, *key, *rpm).with_context(|| format!("setting {} to {} rpm", key, rpm))?;
            writeln!(out, "Set {} to {} rpm", key, rpm)?;
            Ok(())
        }
        Command::Monitor => bail!("monitor needs an interactive terminal"),
    }
}

fn list<T: Transport, W: Write>(session: &mut Session<T>, cfg: &SavedConfig, json: bool, out: &mut W) -> anyhow::Result<()> {
    let total = read_index_count(session);
    let values: Vec<Value> = list_all_keys_with(session, cfg.enumeration_policy()).collect();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&json!({ "total": total, "keys": values }))?)?;
        return Ok(());
    }
    writeln!(out, "Total keys: {}", total)?;
    for value in &values {
        writeln!(out, "{}", value)?;
    }
    Ok(())
}

fn read<T: Transport, W: Write>(session: &mut Session<T>, key: Key, json: bool, out: &mut W) -> anyhow::Result<()> {
    let value = read_key(session, key).with_context(|| format!("reading {}", key))?;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    } else {
        writeln!(out, "{}", value)?;
    }
    Ok(())
}

fn write<T: Transport, W: Write>(session: &mut Session<T>, key: Key, hex: &str, out: &mut W) -> anyhow::Result<()> {
    let bytes = codec::encode_hex_pairs(hex)?;
    if bytes.is_empty() {
        bail!("nothing to write to {}: empty payload", key);
    }
    let current = read_key(session, key).with_context(|| format!("reading {}", key))?;
    if current.size() == 0 {
        bail!("{} is not present on this controller", key);
    }
    let value = Value::new(key, current.data_type, &bytes)?;
    write_key(session, &value).with_context(|| format!("writing {}", key))?;
    writeln!(out, "Wrote {} byte(s) to {}", value.size(), key)?;
    Ok(())
}

fn probe_temperatures<T: Transport>(session: &mut Session<T>) -> Vec<(&'static str, f64)> {
    FAN_REPORT_PROBES
        .iter()
        .filter_map(|name| Key::new(name).ok().map(|k| (*name, k)))
        .map(|(name, key)| (name, get_temperature(session, key)))
        .collect()
}

fn fans<T: Transport, W: Write>(session: &mut Session<T>, json: bool, out: &mut W) -> anyhow::Result<()> {
    let total = fan_count(session).context("reading fan count")?;
    let fans = all_fans(session)?;
    let probes = probe_temperatures(session);

    if json {
        let probes: Vec<_> = probes
            .iter()
            .map(|(key, celsius)| json!({ "key": key, "celsius": celsius }))
            .collect();
        let doc = json!({ "total": total, "fans": fans, "temperatures": probes });
        writeln!(out, "{}", serde_json::to_string_pretty(&doc)?)?;
        return Ok(());
    }

    writeln!(out, "Total fans in system: {}", total)?;
    for fan in &fans {
        writeln!(out)?;
        writeln!(out, "Fan #{}:", fan.index)?;
        writeln!(out, "    Actual speed : {:.0}", fan.actual)?;
        writeln!(out, "    Minimum speed: {:.0}", fan.minimum)?;
        writeln!(out, "    Maximum speed: {:.0}", fan.maximum)?;
        writeln!(out, "    Safe speed   : {:.0}", fan.safe)?;
        writeln!(out, "    Target speed : {:.0}", fan.target)?;
        let mode = match fan.mode {
            FanMode::Auto => "auto",
            FanMode::Forced => "forced",
        };
        writeln!(out, "    Mode         : {}", mode)?;
    }
    if !fans.is_empty() {
        writeln!(out)?;
        for (key, celsius) in &probes {
            writeln!(out, "    Temp {:<4}        = {}", key, celsius)?;
        }
    }
    Ok(())
}

fn temps<T: Transport, W: Write>(session: &mut Session<T>, cfg: &SavedConfig, json: bool, out: &mut W) -> anyhow::Result<()> {
    let report = temperature_report(session, &sensor_table(&cfg.temp_sensors));
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }
    for reading in &report {
        writeln!(out, " {:>20} : {}", reading.name, reading.celsius)?;
    }
    Ok(())
}
