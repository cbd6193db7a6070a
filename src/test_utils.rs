/*
 * Test utilities and fixtures for smctool
 *
 * Shared controller profiles, sessions and helpers used by the unit tests
 * of several modules.
 */

#[cfg(test)]
pub mod test_utils {
    use crate::app::App;
    use crate::cli::Command;
    use crate::commands::run_command;
    use crate::config::{Metric, SavedConfig};
    use crate::sensors::TempSensor;
    use crate::transport::sim::SimulatedController;
    use crate::transport::Session;
    use crate::types::DataType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Session on the two-fan demo controller
    pub fn demo_session() -> Session<SimulatedController> {
        Session::with_transport(SimulatedController::demo())
    }

    /// A single-fan controller
    pub fn create_single_fan_controller() -> SimulatedController {
        SimulatedController::new()
            .with_key("FNum", DataType::UInt8, &[1])
            .with_key("FS! ", DataType::UInt16, &[0x00, 0x00])
            .with_key("F0Ac", DataType::Fpe2, &[0x17, 0x70])
            .with_key("F0Mn", DataType::Fpe2, &[0x0f, 0xa0])
            .with_key("F0Mx", DataType::Fpe2, &[0x4e, 0x20])
            .with_key("F0Sf", DataType::Fpe2, &[0x00, 0x00])
            .with_key("F0Tg", DataType::Fpe2, &[0x17, 0x70])
    }

    pub fn fan_session() -> Session<SimulatedController> {
        Session::with_transport(create_single_fan_controller())
    }

    /// Monitor state on the demo controller, not yet refreshed
    pub fn create_demo_app() -> App<SimulatedController> {
        App::new(demo_session(), &SavedConfig::default(), true)
    }

    pub fn create_mock_saved_config() -> SavedConfig {
        SavedConfig {
            metric: Metric::F,
            temp_sensors: vec![TempSensor { name: "Palm Rest".to_string(), key: "Ts0P".to_string() }],
            max_index_failures: 4,
            refresh_ms: 500,
            log_path: None,
        }
    }

    /// Run a one-shot command with default config and capture its output
    pub fn run_to_string(
        cmd: &Command,
        session: &mut Session<SimulatedController>,
        json: bool,
    ) -> anyhow::Result<String> {
        let mut out = Vec::new();
        run_command(cmd, session, &SavedConfig::default(), json, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    /// Creates a temporary file with JSON content
    pub fn create_temp_json_file<T: serde::Serialize>(data: &T) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        let json = serde_json::to_string_pretty(data).unwrap();
        temp_file.write_all(json.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    /// Asserts that two floating point numbers are approximately equal
    pub fn assert_approx_eq(a: f64, b: f64, tolerance: f64) {
        assert!(
            (a - b).abs() < tolerance,
            "Values {} and {} are not approximately equal (tolerance: {})",
            a, b, tolerance
        );
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use crate::config::{load_config_from, SavedConfig};
    use crate::readers::get_fan_rpm;
    use crate::types::Key;

    #[test]
    fn test_single_fan_controller() {
        let mut session = fan_session();
        assert_eq!(get_fan_rpm(&mut session, Key::new("F0Ac").unwrap()), 1500);
        assert_eq!(get_fan_rpm(&mut session, Key::new("F0Mx").unwrap()), 5000);
    }

    #[test]
    fn test_mock_saved_config_roundtrips_through_file() {
        let config = create_mock_saved_config();
        let file = create_temp_json_file(&config);
        let loaded: SavedConfig = load_config_from(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_assert_approx_eq() {
        assert_approx_eq(1.0, 1.001, 0.01);
        assert_approx_eq(25.5, 25.49, 0.1);
    }

    #[test]
    #[should_panic]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq(1.0, 1.1, 0.01);
    }
}
