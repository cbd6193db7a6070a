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

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::enumerate::{EnumerationPolicy, DEFAULT_MAX_CONSECUTIVE_FAILURES};
use crate::sensors::TempSensor;
use crate::types::Key;

pub const MIN_REFRESH_MS: u64 = 100;
pub const MAX_REFRESH_MS: u64 = 60_000;
const MAX_INDEX_FAILURES: u32 = 1024;
const MAX_TEMP_SENSORS: usize = 256;

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    C,
    F,
    K,
}

fn default_max_index_failures() -> u32 { DEFAULT_MAX_CONSECUTIVE_FAILURES }
fn default_refresh_ms() -> u64 { 1000 }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SavedConfig {
    #[serde(default)]
    pub metric: Metric,
    /// Extra sensors appended to the built-in table
    #[serde(default)]
    pub temp_sensors: Vec<TempSensor>,
    #[serde(default = "default_max_index_failures")]
    pub max_index_failures: u32,
    /// Monitor refresh interval
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

impl Default for SavedConfig {
    fn default() -> Self {
        SavedConfig {
            metric: Metric::default(),
            temp_sensors: Vec::new(),
            max_index_failures: default_max_index_failures(),
            refresh_ms: default_refresh_ms(),
            log_path: None,
        }
    }
}

impl SavedConfig {
    pub fn enumeration_policy(&self) -> EnumerationPolicy {
        EnumerationPolicy { max_consecutive_failures: self.max_index_failures }
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join("smctool").join("config.json");
    }
    if let Ok(home) = env::var("HOME") {
        return Path::new(&home)
            .join(".config")
            .join("smctool")
            .join("config.json");
    }
    PathBuf::from("/etc/smctool/config.json")
}

/// Load and validate the config at the default location.
///
/// `Ok(None)` when no file exists there.
pub fn load_saved_config() -> Result<Option<SavedConfig>, String> {
    let path = config_path();
    match load_config_from(&path) {
        Ok(cfg) => Ok(Some(cfg)),
        Err(LoadError::Missing) => Ok(None),
        Err(LoadError::Invalid(msg)) => Err(format!("{}: {}", path.display(), msg)),
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoadError {
    Missing,
    Invalid(String),
}

pub fn load_config_from(path: &Path) -> Result<SavedConfig, LoadError> {
    let data = match fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(LoadError::Missing),
        Err(e) => return Err(LoadError::Invalid(e.to_string())),
    };
    let cfg: SavedConfig = serde_json::from_str(&data)
        .map_err(|e| LoadError::Invalid(format!("parse error: {}", e)))?;
    validate_saved_config(&cfg).map_err(LoadError::Invalid)?;
    Ok(cfg)
}

fn is_safe_label(s: &str) -> bool {
    if s.is_empty() || s.len() > 64 { return false; }
    s.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ' ' | '(' | ')' | '/'))
}

pub fn validate_saved_config(cfg: &SavedConfig) -> Result<(), String> {
    if cfg.max_index_failures == 0 || cfg.max_index_failures > MAX_INDEX_FAILURES {
        return Err(format!("max_index_failures out of range (1..{})", MAX_INDEX_FAILURES));
    }
    if !(MIN_REFRESH_MS..=MAX_REFRESH_MS).contains(&cfg.refresh_ms) {
        return Err(format!("refresh_ms out of range ({}..{})", MIN_REFRESH_MS, MAX_REFRESH_MS));
    }

    if cfg.temp_sensors.len() > MAX_TEMP_SENSORS {
        return Err(format!("too many temp sensors (max {})", MAX_TEMP_SENSORS));
    }
    for (i, s) in cfg.temp_sensors.iter().enumerate() {
        if !is_safe_label(&s.name) {
            return Err(format!("invalid characters or length in sensor name #{}", i + 1));
        }
        if Key::new(&s.key).is_err() {
            return Err(format!("sensor #{} key '{}' is not a valid key", i + 1, s.key));
        }
    }

    if let Some(p) = &cfg.log_path {
        if p.as_os_str().is_empty() { return Err("log_path is empty".to_string()); }
        if p.is_dir() { return Err("log_path is a directory".to_string()); }
    }
    Ok(())
}
