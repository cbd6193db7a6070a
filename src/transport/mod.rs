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

//! Controller transport.
//!
//! Every exchange with the SMC is one fixed-size [`KeyData`] in and one out
//! through a single privileged call. [`Transport`] is that call; [`Session`]
//! owns a transport for the lifetime of a connection.
//!
//! # Commands
//!
//! The `command` byte of the request selects the sub-operation:
//! - 5 = read bytes
//! - 6 = write bytes
//! - 8 = read key at index
//! - 9 = read key info (size and type)

#[cfg(target_os = "macos")]
pub mod iokit;
pub mod sim;

use thiserror::Error;
use tracing::debug;

use crate::codec::PAYLOAD_CAPACITY;

/// Selector of the SMC user-client method on the kernel side.
pub const SMC_SELECTOR: u32 = 2;

pub const CMD_READ_BYTES: u8 = 5;
pub const CMD_WRITE_BYTES: u8 = 6;
pub const CMD_READ_INDEX: u8 = 8;
pub const CMD_READ_KEYINFO: u8 = 9;

/// IOKit service name of the controller.
pub const SMC_SERVICE: &str = "AppleSMC";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("No {0} service found")]
    ServiceNotFound(String),
    #[error("Failed to open controller connection: {0:#010x}")]
    ConnectFailed(u32),
    #[error("Controller call failed: {0:#010x}")]
    CallFailed(u32),
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyDataVersion {
    pub major: u8,
    pub minor: u8,
    pub build: u8,
    pub reserved: u8,
    pub release: u16,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerLimits {
    pub version: u16,
    pub length: u16,
    pub cpu_limit: u32,
    pub gpu_limit: u32,
    pub mem_limit: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyInfo {
    pub data_size: u32,
    pub data_type: u32,
    pub attributes: u8,
}

/// Request and response structure of the SMC user client.
///
/// Field order and padding follow the kernel's C layout (80 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyData {
    pub key: u32,
    pub version: KeyDataVersion,
    pub power_limits: PowerLimits,
    pub key_info: KeyInfo,
    pub result: u8,
    pub status: u8,
    pub command: u8,
    pub index: u32,
    pub bytes: [u8; PAYLOAD_CAPACITY],
}

const _: () = assert!(std::mem::size_of::<KeyData>() == 80);

impl KeyData {
    pub fn read_key_info(key: u32) -> Self {
        KeyData { key, command: CMD_READ_KEYINFO, ..Default::default() }
    }

    pub fn read_bytes(key: u32, data_size: u32) -> Self {
        KeyData {
            key,
            command: CMD_READ_BYTES,
            key_info: KeyInfo { data_size, ..Default::default() },
            ..Default::default()
        }
    }

    pub fn write_bytes(key: u32, data_size: u32, bytes: [u8; PAYLOAD_CAPACITY]) -> Self {
        KeyData {
            key,
            command: CMD_WRITE_BYTES,
            key_info: KeyInfo { data_size, ..Default::default() },
            bytes,
            ..Default::default()
        }
    }

    pub fn read_index(index: u32) -> Self {
        KeyData { command: CMD_READ_INDEX, index, ..Default::default() }
    }
}

/// The single blocking call primitive to the controller.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    fn call(&mut self, selector: u32, input: &KeyData) -> Result<KeyData, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn call(&mut self, selector: u32, input: &KeyData) -> Result<KeyData, TransportError> {
        (**self).call(selector, input)
    }
}

/// An open connection to the controller.
///
/// Operations take `&mut Session`, so a session serves one logical
/// operation at a time. Dropping the session releases the handle.
pub struct Session<T: Transport> {
    transport: T,
    calls: u64,
}

impl<T: Transport> Session<T> {
    pub fn with_transport(transport: T) -> Self {
        Session { transport, calls: 0 }
    }

    pub fn call(&mut self, selector: u32, input: &KeyData) -> Result<KeyData, TransportError> {
        self.calls += 1;
        debug!(selector, command = input.command, key = input.key, index = input.index, "smc call");
        self.transport.call(selector, input)
    }

    /// Number of transport calls issued so far.
    pub fn call_count(&self) -> u64 {
        self.calls
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Release the controller handle.
    pub fn close(self) {
        drop(self)
    }
}

impl Session<Box<dyn Transport>> {
    /// Connect to the host's controller.
    #[cfg(target_os = "macos")]
    pub fn open() -> Result<Self, TransportError> {
        let transport = iokit::IoKitTransport::open()?;
        Ok(Session::with_transport(Box::new(transport)))
    }

    #[cfg(not(target_os = "macos"))]
    pub fn open() -> Result<Self, TransportError> {
        Err(TransportError::ServiceNotFound(SMC_SERVICE.to_string()))
    }

    pub fn simulated(controller: sim::SimulatedController) -> Self {
        Session::with_transport(Box::new(controller))
    }
}
