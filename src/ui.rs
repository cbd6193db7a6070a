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

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::app::App;
use crate::config::Metric;
use crate::readers::FanMode;
use crate::transport::Transport;

/// Draw the monitor: header | fans | temperatures | status.
pub fn ui<T: Transport>(f: &mut Frame, app: &App<T>) {
    let fan_rows = app.fans.len().max(1) as u16 + 3;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(fan_rows),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_fans(f, app, chunks[1]);
    render_temps(f, app, chunks[2]);
    render_status_bar(f, app, chunks[3]);
}

fn render_header<T: Transport>(f: &mut Frame, app: &App<T>, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
        .split(area);

    let source = if app.simulated { "simulated" } else { "AppleSMC" };
    let header_text = format!(
        " smctool  |  Controller: {}  |  Keys: {}  |  Refresh: {} ms ",
        source,
        app.key_count,
        app.refresh_interval.as_millis()
    );
    let header = Paragraph::new(header_text).style(Style::default().fg(Color::Yellow));
    f.render_widget(header, cols[0]);

    let metric_label = match app.metric {
        Metric::C => "Metric: °C",
        Metric::F => "Metric: °F",
        Metric::K => "Metric: K",
    };
    let metric_widget = Paragraph::new(metric_label)
        .alignment(Alignment::Right)
        .style(Style::default().fg(Color::Gray));
    f.render_widget(metric_widget, cols[1]);
}

fn render_fans<T: Transport>(f: &mut Frame, app: &App<T>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" FANS ({}) ", app.fans.len()));

    let header_style = Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let mut items: Vec<ListItem> = Vec::with_capacity(app.fans.len() + 1);
    items.push(
        ListItem::new(format!(
            "{:<6} {:>8} {:>8} {:>8} {:>8} {:>8}  {}",
            "Fan", "Actual", "Min", "Max", "Safe", "Target", "Mode"
        ))
        .style(header_style),
    );
    items.extend(app.fans.iter().map(|fan| {
        let (mode, style) = match fan.mode {
            FanMode::Auto => ("auto", Style::default()),
            FanMode::Forced => ("forced", Style::default().fg(Color::Magenta)),
        };
        ListItem::new(format!(
            "#{:<5} {:>8.0} {:>8.0} {:>8.0} {:>8.0} {:>8.0}  {}",
            fan.index, fan.actual, fan.minimum, fan.maximum, fan.safe, fan.target, mode
        ))
        .style(style)
    }));

    f.render_widget(List::new(items).block(block), area);
}

fn render_temps<T: Transport>(f: &mut Frame, app: &App<T>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" TEMP ({}) ", app.temps.len()))
        .border_style(Style::default().fg(Color::Cyan));

    let header_style = Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let highlight = Style::default().bg(Color::Blue).fg(Color::White);

    let (_, unit) = app.convert_temp(0.0);
    let mut items: Vec<ListItem> = Vec::with_capacity(app.temps.len() + 1);
    items.push(ListItem::new(format!("{:<24} {:<6} {:>8}", "Name", "Key", unit)).style(header_style));
    items.extend(app.temps.iter().map(|t| {
        let (val, unit_str) = app.convert_temp(t.celsius);
        ListItem::new(format!("{:<24} {:<6} {:>6.1} {}", t.name, t.key, val, unit_str))
    }));

    let mut state = ListState::default();
    if !app.temps.is_empty() {
        state.select(Some(app.temps_idx + 1));
    }

    let list = List::new(items).block(block).highlight_style(highlight);
    f.render_stateful_widget(list, area, &mut state);
}

fn render_status_bar<T: Transport>(f: &mut Frame, app: &App<T>, area: Rect) {
    let style = if app.status.starts_with("Error") {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Gray)
    };
    f.render_widget(Paragraph::new(app.status.as_str()).style(style), area);
}
