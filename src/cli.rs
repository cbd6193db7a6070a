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

//! Command line interface

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::types::Key;

#[derive(Parser, Debug)]
#[command(name = "smctool")]
#[command(version)]
#[command(about = "Read and write Apple System Management Controller keys")]
#[command(long_about = "Read and write Apple System Management Controller keys

EXAMPLES:
    smctool list                       List every key with its decoded value
    smctool read TC0P                  Read one key
    smctool write LSOO 01              Write raw hex bytes to a key
    smctool fans                       Fan speeds and modes
    smctool temps                      Named temperature sensors
    smctool set-rpm F0Mn 1800          Set a fan speed key
    smctool --simulate monitor         Live dashboard against a demo controller

ENVIRONMENT VARIABLES:
    RUST_LOG=smctool=debug    Diagnostic output on stderr

FILES:
    ~/.config/smctool/config.json     Settings (metric, sensors, refresh)
    /var/log/smctool/events.json      Audit log written with --logging")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Use an in-memory demo controller instead of the hardware
    #[arg(long, global = true)]
    pub simulate: bool,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Append events to the audit log
    #[arg(long, global = true)]
    pub logging: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// More diagnostics on stderr (-v, -vv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List all keys and values
    List,
    /// Read the value of a key
    Read {
        key: Key,
    },
    /// Write hex bytes to a key
    Write {
        key: Key,
        /// Hex pairs, e.g. 1f40
        hex: String,
    },
    /// Fan info decoded
    Fans,
    /// Temperature info decoded
    Temps,
    /// Number of keys the controller publishes
    Count,
    /// Write a fan speed key
    SetRpm {
        key: Key,
        rpm: u32,
    },
    /// Live fan and temperature dashboard
    Monitor,
}

impl Command {
    /// Commands that change controller state.
    pub fn is_write(&self) -> bool {
        matches!(self, Command::Write { .. } | Command::SetRpm { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_read() {
        let cli = Cli::try_parse_from(["smctool", "read", "TC0P"]).unwrap();
        assert_eq!(cli.command, Command::Read { key: Key::new("TC0P").unwrap() });
        assert!(!cli.simulate);
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["smctool", "fans", "--simulate", "--json", "-vv"]).unwrap();
        assert!(cli.simulate);
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_key_with_space() {
        let cli = Cli::try_parse_from(["smctool", "read", "FS! "]).unwrap();
        assert_eq!(cli.command, Command::Read { key: Key::new("FS! ").unwrap() });
    }

    #[test]
    fn test_invalid_key_rejected() {
        assert!(Cli::try_parse_from(["smctool", "read", "TOOLONG"]).is_err());
        assert!(Cli::try_parse_from(["smctool", "set-rpm", "F0Mn", "fast"]).is_err());
    }

    #[test]
    fn test_is_write() {
        let key = Key::new("F0Mn").unwrap();
        assert!(Command::Write { key, hex: "00".into() }.is_write());
        assert!(Command::SetRpm { key, rpm: 1 }.is_write());
        assert!(!Command::Fans.is_write());
        assert!(!Command::Monitor.is_write());
    }

    #[test]
    fn test_config_path_flag() {
        let cli = Cli::try_parse_from(["smctool", "--config", "/tmp/c.json", "count"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
        assert_eq!(cli.command, Command::Count);
    }
}
