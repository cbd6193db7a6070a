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

//! smctool - Apple System Management Controller key access
//!
//! This library talks to the SMC through a single call primitive, reads and
//! writes its four-character keys, enumerates the key table and decodes fan
//! and temperature values.

pub mod codec;
pub mod types;
pub mod transport;
pub mod protocol;
pub mod enumerate;
pub mod sensors;
pub mod readers;
pub mod config;
pub mod logger;
pub mod cli;
pub mod commands;
pub mod app;
pub mod events;
pub mod ui;

#[cfg(test)]
pub mod test_utils;
