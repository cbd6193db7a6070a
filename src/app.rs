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

use std::time::{Duration, Instant};

use tracing::warn;

use crate::config::{Metric, SavedConfig, MAX_REFRESH_MS, MIN_REFRESH_MS};
use crate::protocol::read_index_count;
use crate::readers::{all_fans, temperature_report, FanStatus, TemperatureReading};
use crate::sensors::{sensor_table, TempSensor};
use crate::transport::{Session, Transport};

const HELP: &str = "q: quit | r: refresh | m: unit | +/-: speed | ↑/↓: scroll";

/// State of the live monitor.
pub struct App<T: Transport> {
    session: Session<T>,
    sensors: Vec<TempSensor>,
    pub last_refresh: Option<Instant>,
    pub refresh_interval: Duration,
    pub status: String,
    pub simulated: bool,
    pub key_count: u32,
    pub fans: Vec<FanStatus>,
    pub temps: Vec<TemperatureReading>,
    pub temps_idx: usize,
    pub metric: Metric,
}

impl<T: Transport> App<T> {
    pub fn new(session: Session<T>, cfg: &SavedConfig, simulated: bool) -> Self {
        App {
            session,
            sensors: sensor_table(&cfg.temp_sensors),
            last_refresh: None,
            refresh_interval: Duration::from_millis(cfg.refresh_ms.clamp(MIN_REFRESH_MS, MAX_REFRESH_MS)),
            status: HELP.to_string(),
            simulated,
            key_count: 0,
            fans: Vec::new(),
            temps: Vec::new(),
            temps_idx: 0,
            metric: cfg.metric,
        }
    }

    pub fn refresh(&mut self) {
        self.key_count = read_index_count(&mut self.session);
        match all_fans(&mut self.session) {
            Ok(fans) => {
                self.fans = fans;
                self.status = HELP.to_string();
            }
            Err(e) => {
                warn!("fan refresh failed: {}", e);
                self.fans.clear();
                self.status = format!("Error: {}", e);
            }
        }
        self.temps = temperature_report(&mut self.session, &self.sensors);
        if self.temps_idx >= self.temps.len() {
            self.temps_idx = self.temps.len().saturating_sub(1);
        }
        self.last_refresh = Some(Instant::now());
    }

    /// True when the next refresh is due.
    pub fn refresh_due(&self) -> bool {
        self.last_refresh
            .map(|t| t.elapsed() >= self.refresh_interval)
            .unwrap_or(true)
    }

    /// Time left until the next refresh.
    pub fn time_to_refresh(&self) -> Duration {
        self.last_refresh
            .map(|t| self.refresh_interval.saturating_sub(t.elapsed()))
            .unwrap_or(Duration::ZERO)
    }

    pub fn faster(&mut self) {
        let ms = (self.refresh_interval.as_millis() as u64 / 2).max(MIN_REFRESH_MS);
        self.refresh_interval = Duration::from_millis(ms);
    }

    pub fn slower(&mut self) {
        let ms = (self.refresh_interval.as_millis() as u64 * 2).min(MAX_REFRESH_MS);
        self.refresh_interval = Duration::from_millis(ms);
    }

    pub fn scroll_up(&mut self) {
        self.temps_idx = self.temps_idx.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        if self.temps_idx + 1 < self.temps.len() {
            self.temps_idx += 1;
        }
    }

    pub fn cycle_metric(&mut self) {
        self.metric = match self.metric {
            Metric::C => Metric::F,
            Metric::F => Metric::K,
            Metric::K => Metric::C,
        };
    }

    pub fn convert_temp(&self, celsius: f64) -> (f64, &'static str) {
        match self.metric {
            Metric::C => (celsius, "°C"),
            Metric::F => (celsius * 9.0 / 5.0 + 32.0, "°F"),
            Metric::K => (celsius + 273.15, "K"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::FanMode;
    use crate::test_utils::test_utils::{assert_approx_eq, create_demo_app};
    use crate::transport::sim::SimulatedController;

    #[test]
    fn test_new_app_defaults() {
        let app = create_demo_app();
        assert!(app.fans.is_empty());
        assert!(app.refresh_due());
        assert_eq!(app.time_to_refresh(), Duration::ZERO);
        assert_eq!(app.refresh_interval, Duration::from_millis(1000));
        assert_eq!(app.metric, Metric::C);
    }

    #[test]
    fn test_refresh_reads_fans_and_temps() {
        let mut app = create_demo_app();
        app.refresh();
        assert_eq!(app.fans.len(), 2);
        assert_eq!(app.fans[1].mode, FanMode::Forced);
        assert_eq!(app.key_count, 21);
        assert!(app.temps.iter().any(|t| t.key == "TC0D"));
        assert!(app.temps.iter().all(|t| t.celsius > 0.0));
        assert!(!app.refresh_due());
    }

    #[test]
    fn test_refresh_failure_sets_status() {
        let session = Session::with_transport(SimulatedController::new().fail_all());
        let mut app = App::new(session, &SavedConfig::default(), true);
        app.refresh();
        assert!(app.fans.is_empty());
        assert!(app.temps.is_empty());
        assert!(app.status.starts_with("Error:"));
        assert_eq!(app.key_count, 0);
    }

    #[test]
    fn test_refresh_interval_bounds() {
        let mut app = create_demo_app();
        for _ in 0..10 {
            app.faster();
        }
        assert_eq!(app.refresh_interval, Duration::from_millis(100));
        for _ in 0..20 {
            app.slower();
        }
        assert_eq!(app.refresh_interval, Duration::from_millis(60_000));
    }

    #[test]
    fn test_scroll_is_bounded() {
        let mut app = create_demo_app();
        app.scroll_up();
        assert_eq!(app.temps_idx, 0);
        app.refresh();
        let n = app.temps.len();
        for _ in 0..n + 5 {
            app.scroll_down();
        }
        assert_eq!(app.temps_idx, n - 1);
    }

    #[test]
    fn test_cycle_metric() {
        let mut app = create_demo_app();
        app.cycle_metric();
        assert_eq!(app.metric, Metric::F);
        app.cycle_metric();
        assert_eq!(app.metric, Metric::K);
        app.cycle_metric();
        assert_eq!(app.metric, Metric::C);
    }

    #[test]
    fn test_convert_temp() {
        let mut app = create_demo_app();
        assert_eq!(app.convert_temp(25.0), (25.0, "°C"));
        app.metric = Metric::F;
        let (f, unit) = app.convert_temp(25.0);
        assert_approx_eq(f, 77.0, 1e-9);
        assert_eq!(unit, "°F");
        app.metric = Metric::K;
        let (k, _) = app.convert_temp(25.0);
        assert_approx_eq(k, 298.15, 1e-9);
    }

    #[test]
    fn test_config_sensors_and_metric_used() {
        let cfg = SavedConfig {
            metric: Metric::K,
            temp_sensors: vec![TempSensor { name: "Extra".into(), key: "TX0P".into() }],
            refresh_ms: 250,
            ..SavedConfig::default()
        };
        let mut sim = SimulatedController::demo();
        sim.insert("TX0P", crate::types::DataType::Sp78, &[0x20, 0x00]);
        let mut app = App::new(Session::with_transport(sim), &cfg, true);
        app.refresh();
        assert_eq!(app.metric, Metric::K);
        assert_eq!(app.refresh_interval, Duration::from_millis(250));
        assert!(app.temps.iter().any(|t| t.name == "Extra" && t.celsius == 32.0));
    }
}
