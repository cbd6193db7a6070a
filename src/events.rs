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

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::App;
use crate::transport::Transport;

/// Apply one key press to the monitor. Returns `true` to quit.
pub fn handle_key_event<T: Transport>(app: &mut App<T>, key_event: KeyEvent) -> anyhow::Result<bool> {
    let KeyEvent { code, modifiers, kind, .. } = key_event;
    if kind == KeyEventKind::Release {
        return Ok(false);
    }

    match (code, modifiers) {
        (KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL) => return Ok(true),
        (KeyCode::Char('q'), _) => return Ok(true),
        (KeyCode::Esc, _) => return Ok(true),
        (KeyCode::Char('r'), _) => app.refresh(),
        (KeyCode::Char('m'), _) => app.cycle_metric(),
        (KeyCode::Char('+'), _) | (KeyCode::Char('='), _) => app.faster(),
        (KeyCode::Char('-'), _) => app.slower(),
        (KeyCode::Up, _) => app.scroll_up(),
        (KeyCode::Down, _) => app.scroll_down(),
        _ => {}
    }
    Ok(false)
}
