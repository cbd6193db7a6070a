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

//! IOKit user-client transport to the AppleSMC kernel service.

use std::ffi::CString;
use std::mem::size_of;

use libc::{c_char, c_void};
use tracing::debug;

use super::{KeyData, Transport, TransportError, SMC_SERVICE};

#[allow(non_camel_case_types)]
type kern_return_t = libc::c_int;
#[allow(non_camel_case_types)]
type mach_port_t = libc::c_uint;
#[allow(non_camel_case_types)]
type io_object_t = mach_port_t;

const KERN_SUCCESS: kern_return_t = 0;
// kIOMasterPortDefault
const MASTER_PORT_DEFAULT: mach_port_t = 0;

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    fn IOServiceMatching(name: *const c_char) -> *mut c_void;
    fn IOServiceGetMatchingServices(
        master_port: mach_port_t,
        matching: *mut c_void,
        existing: *mut io_object_t,
    ) -> kern_return_t;
    fn IOIteratorNext(iterator: io_object_t) -> io_object_t;
    fn IOObjectRelease(object: io_object_t) -> kern_return_t;
    fn IOServiceOpen(
        service: io_object_t,
        owning_task: mach_port_t,
        connect_type: u32,
        connect: *mut io_object_t,
    ) -> kern_return_t;
    fn IOServiceClose(connect: io_object_t) -> kern_return_t;
    fn IOConnectCallStructMethod(
        connection: mach_port_t,
        selector: u32,
        input: *const c_void,
        input_size: usize,
        output: *mut c_void,
        output_size: *mut usize,
    ) -> kern_return_t;
}

extern "C" {
    static mach_task_self_: mach_port_t;
}

pub struct IoKitTransport {
    conn: io_object_t,
}

impl IoKitTransport {
    pub fn open() -> Result<Self, TransportError> {
        let name = CString::new(SMC_SERVICE)
            .map_err(|_| TransportError::ServiceNotFound(SMC_SERVICE.to_string()))?;

        // SAFETY: plain IOKit calls; the matching dictionary is consumed by
        // IOServiceGetMatchingServices and every object we obtain is released.
        unsafe {
            let matching = IOServiceMatching(name.as_ptr());
            if matching.is_null() {
                return Err(TransportError::ServiceNotFound(SMC_SERVICE.to_string()));
            }
            let mut iterator: io_object_t = 0;
            let kr = IOServiceGetMatchingServices(MASTER_PORT_DEFAULT, matching, &mut iterator);
            if kr != KERN_SUCCESS {
                debug!("IOServiceGetMatchingServices() = {:#010x}", kr as u32);
                return Err(TransportError::ServiceNotFound(SMC_SERVICE.to_string()));
            }

            let device = IOIteratorNext(iterator);
            IOObjectRelease(iterator);
            if device == 0 {
                return Err(TransportError::ServiceNotFound(SMC_SERVICE.to_string()));
            }

            let mut conn: io_object_t = 0;
            let kr = IOServiceOpen(device, mach_task_self_, 0, &mut conn);
            IOObjectRelease(device);
            if kr != KERN_SUCCESS {
                return Err(TransportError::ConnectFailed(kr as u32));
            }
            debug!(conn, "opened {}", SMC_SERVICE);
            Ok(IoKitTransport { conn })
        }
    }
}

impl Transport for IoKitTransport {
    fn call(&mut self, selector: u32, input: &KeyData) -> Result<KeyData, TransportError> {
        let mut output = KeyData::default();
        let mut output_size = size_of::<KeyData>();
        // SAFETY: both buffers are live `KeyData` values of the advertised size.
        let kr = unsafe {
            IOConnectCallStructMethod(
                self.conn,
                selector,
                input as *const KeyData as *const c_void,
                size_of::<KeyData>(),
                &mut output as *mut KeyData as *mut c_void,
                &mut output_size,
            )
        };
        if kr != KERN_SUCCESS {
            return Err(TransportError::CallFailed(kr as u32));
        }
        Ok(output)
    }
}

impl Drop for IoKitTransport {
    fn drop(&mut self) {
        // SAFETY: `conn` came from IOServiceOpen and is closed exactly once here.
        let kr = unsafe { IOServiceClose(self.conn) };
        if kr != KERN_SUCCESS {
            debug!("IOServiceClose() = {:#010x}", kr as u32);
        }
    }
}
