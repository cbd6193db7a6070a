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

//! Key discovery by walking the controller's index.
//!
//! Positions are read from 0 upwards. The walk ends at the first position
//! whose key resolves to an empty value. A position whose index call fails is
//! skipped, and too many failures in a row end the walk.

use tracing::{debug, warn};

use crate::protocol::read_key;
use crate::transport::{KeyData, Session, Transport, SMC_SELECTOR};
use crate::types::{Key, Value};

pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumerationPolicy {
    /// Consecutive failed index calls after which the walk gives up.
    pub max_consecutive_failures: u32,
}

impl Default for EnumerationPolicy {
    fn default() -> Self {
        EnumerationPolicy { max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES }
    }
}

/// Iterator over every key the controller publishes, in index order.
pub struct KeyIter<'s, T: Transport> {
    session: &'s mut Session<T>,
    policy: EnumerationPolicy,
    position: u32,
    failures: u32,
    skipped: u32,
    done: bool,
}

impl<'s, T: Transport> KeyIter<'s, T> {
    /// Positions skipped so far because the index call failed.
    pub fn skipped(&self) -> u32 {
        self.skipped
    }
}

impl<'s, T: Transport> Iterator for KeyIter<'s, T> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        while !self.done {
            let position = self.position;
            let out = match self.session.call(SMC_SELECTOR, &KeyData::read_index(position)) {
                Ok(out) => out,
                Err(e) => {
                    self.position = position.wrapping_add(1);
                    self.failures += 1;
                    self.skipped += 1;
                    warn!(position, "index read failed, skipping: {}", e);
                    if self.failures >= self.policy.max_consecutive_failures {
                        warn!(position, failures = self.failures, "giving up key enumeration");
                        self.done = true;
                    }
                    continue;
                }
            };
            self.failures = 0;

            let key = Key::from_raw(out.key);
            match read_key(self.session, key) {
                Ok(value) if !value.is_empty() => {
                    self.position = position.wrapping_add(1);
                    return Some(value);
                }
                Ok(_) => debug!(position, %key, "end of key table"),
                Err(e) => debug!(position, %key, "key at index unreadable, stopping: {}", e),
            }
            self.done = true;
        }
        None
    }
}

/// Walk all keys from position 0 with the default failure bound.
pub fn list_all_keys<T: Transport>(session: &mut Session<T>) -> KeyIter<'_, T> {
    list_all_keys_with(session, EnumerationPolicy::default())
}

pub fn list_all_keys_with<T: Transport>(
    session: &mut Session<T>,
    policy: EnumerationPolicy,
) -> KeyIter<'_, T> {
    KeyIter {
        session,
        policy: EnumerationPolicy {
            max_consecutive_failures: policy.max_consecutive_failures.max(1),
        },
        position: 0,
        failures: 0,
        skipped: 0,
        done: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::sim::SimulatedController;
    use crate::transport::CMD_READ_INDEX;
    use crate::types::DataType;

    fn five_key_controller() -> SimulatedController {
        SimulatedController::new()
            .with_key("AAAA", DataType::UInt8, &[1])
            .with_key("BBBB", DataType::UInt16, &[0, 2])
            .with_key("CCCC", DataType::Fpe2, &[0x12, 0xc0])
            .with_key("DDDD", DataType::Sp78, &[0x19, 0x00])
            .with_key("EEEE", DataType::UInt32, &[0, 0, 0, 5])
            .with_key("ZERO", DataType::UInt8, &[])
            .with_key("NEVR", DataType::UInt8, &[9])
    }

    #[test]
    fn test_stops_at_first_empty_value() {
        let mut session = Session::with_transport(five_key_controller());
        let values: Vec<Value> = list_all_keys(&mut session).collect();
        let names: Vec<String> = values.iter().map(|v| v.key.to_string()).collect();
        assert_eq!(names, vec!["AAAA", "BBBB", "CCCC", "DDDD", "EEEE"]);
    }

    #[test]
    fn test_stops_at_end_of_table() {
        let sim = SimulatedController::new()
            .with_key("AAAA", DataType::UInt8, &[1])
            .with_key("BBBB", DataType::UInt8, &[2]);
        let mut session = Session::with_transport(sim);
        assert_eq!(list_all_keys(&mut session).count(), 2);
    }

    #[test]
    fn test_values_carry_their_key_and_payload() {
        let mut session = Session::with_transport(five_key_controller());
        let values: Vec<Value> = list_all_keys(&mut session).collect();
        assert_eq!(values[2].key, Key::new("CCCC").unwrap());
        assert_eq!(values[2].data_type, DataType::Fpe2);
        assert_eq!(values[2].bytes(), &[0x12, 0xc0]);
    }

    #[test]
    fn test_is_restartable() {
        let mut session = Session::with_transport(five_key_controller());
        let first = list_all_keys(&mut session).count();
        let second = list_all_keys(&mut session).count();
        assert_eq!(first, 5);
        assert_eq!(second, 5);
    }

    #[test]
    fn test_skips_failed_positions() {
        let sim = five_key_controller().fail_position(1).fail_position(3);
        let mut session = Session::with_transport(sim);
        let mut iter = list_all_keys(&mut session);
        let names: Vec<String> = iter.by_ref().map(|v| v.key.to_string()).collect();
        assert_eq!(names, vec!["AAAA", "CCCC", "EEEE"]);
        assert_eq!(iter.skipped(), 2);
    }

    #[test]
    fn test_dead_transport_terminates() {
        let mut session = Session::with_transport(SimulatedController::new().fail_all());
        let policy = EnumerationPolicy { max_consecutive_failures: 4 };
        assert_eq!(list_all_keys_with(&mut session, policy).count(), 0);

        let index_calls = session
            .transport()
            .calls()
            .iter()
            .filter(|c| c.command == CMD_READ_INDEX)
            .count();
        assert_eq!(index_calls, 4);
    }

    #[test]
    fn test_failure_counter_resets_after_success() {
        // Failures at 0,1 and 3,4 never reach three in a row.
        let sim = five_key_controller()
            .fail_position(0)
            .fail_position(1)
            .fail_position(3)
            .fail_position(4);
        let mut session = Session::with_transport(sim);
        let policy = EnumerationPolicy { max_consecutive_failures: 3 };
        let names: Vec<String> = list_all_keys_with(&mut session, policy)
            .map(|v| v.key.to_string())
            .collect();
        assert_eq!(names, vec!["CCCC"]);
    }

    #[test]
    fn test_unreadable_key_ends_walk() {
        let sim = five_key_controller().fail_key("CCCC");
        let mut session = Session::with_transport(sim);
        assert_eq!(list_all_keys(&mut session).count(), 2);
    }

    #[test]
    fn test_zero_failure_bound_is_clamped() {
        let mut session = Session::with_transport(SimulatedController::new().fail_all());
        let policy = EnumerationPolicy { max_consecutive_failures: 0 };
        assert_eq!(list_all_keys_with(&mut session, policy).count(), 0);
        assert_eq!(session.call_count(), 1);
    }
}
