//!
//! Settings document loading
//!
//! The document carries the calibration measurements under `translation` and the travel
//! limits under `limits`. YAML and JSON are both accepted.
//!

pub mod error;

use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::calibration::{self, CalibrationInput, CorrectionMatrix};
use crate::hardware::AxisLimits;
use error::SettingsError;

/// The settings file looked for when none is given.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.yaml";

///
/// Everything a conversion needs from the settings document.
///
/// # Fields:
/// - `calibration`: The six calibration measurements
/// - `limits`: The travel limits
///
#[derive(Debug, Clone, PartialEq, getset::Getters)]
#[get = "pub"]
pub struct Settings {
    calibration: CalibrationInput,
    limits: AxisLimits,
}

impl Settings {
    pub fn new(calibration: CalibrationInput, limits: AxisLimits) -> Settings {
        Settings { calibration, limits }
    }

    ///
    /// Loads a settings file. Files ending in `.json` are read as JSON, anything else as YAML.
    ///
    /// # Parameters:
    /// - `path`: The settings file path
    ///
    /// # Returns:
    /// - The settings
    /// - A `SettingsError` if the file cannot be read, parsed or is incomplete
    ///
    pub fn load(path: impl AsRef<Path>) -> Result<Settings, SettingsError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(source) => return Err(SettingsError::Io { path: path.to_path_buf(), source }),
        };

        info!("Loaded settings from {}", path.display());

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Settings::from_json_str(&text)
        } else {
            Settings::from_yaml_str(&text)
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Settings, SettingsError> {
        let document: Value = serde_yaml::from_str(text)?;
        Settings::from_document(&document)
    }

    pub fn from_json_str(text: &str) -> Result<Settings, SettingsError> {
        let document: Value = serde_json::from_str(text)?;
        Settings::from_document(&document)
    }

    ///
    /// Extracts the settings from a parsed document tree.
    ///
    /// # Parameters:
    /// - `document`: The document root
    ///
    /// # Returns:
    /// - The settings
    /// - `MissingField` naming the first value that is absent or not numeric
    ///
    pub fn from_document(document: &Value) -> Result<Settings, SettingsError> {
        let translation = &document["translation"];
        let field = |name: &str| number(&translation[name], || format!("translation.{}", name));

        let calibration = CalibrationInput {
            side_x: field("side_x")?,
            side_y: field("side_y")?,
            diagonal_from_x0y0: field("diagonal_from_x0y0")?,
            height: field("height")?,
            z_to_x: field("z_to_x")?,
            z_to_y: field("z_to_y")?,
        };

        let limits = &document["limits"];
        let upper = triple(&limits["upper"], "limits.upper")?;
        let lower = triple(&limits["lower"], "limits.lower")?;

        Ok(Settings { calibration, limits: AxisLimits::new(upper, lower) })
    }

    ///
    /// Solves the calibration held in these settings.
    ///
    pub fn correction(&self) -> Result<CorrectionMatrix, SettingsError> {
        Ok(calibration::solve(&self.calibration)?)
    }
}

fn number(value: &Value, field: impl FnOnce() -> String) -> Result<f64, SettingsError> {
    match value.as_f64() {
        Some(number) => Ok(number),
        None => Err(SettingsError::MissingField { field: field() }),
    }
}

fn triple(value: &Value, field: &str) -> Result<[f64; 3], SettingsError> {
    let mut out = [0.; 3];
    for (index, slot) in out.iter_mut().enumerate() {
        *slot = number(&value[index], || format!("{}[{}]", field, index))?;
    }

    Ok(out)
}


#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = "
translation:
  side_x: 100.0
  side_y: 100
  diagonal_from_x0y0: 141.421
  height: 100.0
  z_to_x: 0.0
  z_to_y: -0.25
limits:
  upper: [500.0, 400.0, 100.0]
  lower: [-10.0, -10.0, -50.0]
";

    #[test]
    fn yaml_document() {
        let settings = Settings::from_yaml_str(YAML).unwrap();
        assert_eq!(settings.calibration().side_y, 100.);
        assert_eq!(settings.calibration().z_to_y, -0.25);
        assert_eq!(settings.limits().upper(), &[500., 400., 100.]);
        assert_eq!(settings.limits().lower(), &[-10., -10., -50.]);
        assert!(settings.correction().is_ok());
    }

    #[test]
    fn json_document() {
        let json = r#"{
            "translation": {"side_x": 100, "side_y": 100, "diagonal_from_x0y0": 141.421,
                            "height": 100, "z_to_x": 0, "z_to_y": 0},
            "limits": {"upper": [1, 2, 3], "lower": [-1, -2, -3]}
        }"#;
        let settings = Settings::from_json_str(json).unwrap();
        assert_eq!(settings.limits().upper(), &[1., 2., 3.]);
    }

    #[test]
    fn missing_measurement_is_named() {
        let yaml = YAML.replace("  height: 100.0\n", "");
        match Settings::from_yaml_str(&yaml) {
            Err(SettingsError::MissingField { field }) => assert_eq!(field, "translation.height"),
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn non_numeric_measurement_is_missing() {
        let yaml = YAML.replace("side_x: 100.0", "side_x: wide");
        match Settings::from_yaml_str(&yaml) {
            Err(SettingsError::MissingField { field }) => assert_eq!(field, "translation.side_x"),
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn short_limit_list_is_named() {
        let yaml = YAML.replace("[-10.0, -10.0, -50.0]", "[-10.0, -10.0]");
        match Settings::from_yaml_str(&yaml) {
            Err(SettingsError::MissingField { field }) => assert_eq!(field, "limits.lower[2]"),
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn missing_sections() {
        assert!(matches!(
            Settings::from_yaml_str("limits: {}"),
            Err(SettingsError::MissingField { .. })
        ));
        assert!(matches!(Settings::from_json_str("{"), Err(SettingsError::Json(_))));
    }

    #[test]
    fn impossible_measurements_fail_to_solve() {
        let yaml = YAML.replace("141.421", "260.0");
        let settings = Settings::from_yaml_str(&yaml).unwrap();
        assert!(matches!(settings.correction(), Err(SettingsError::Calibration(_))));
    }

    #[test]
    fn unreadable_file() {
        assert!(matches!(
            Settings::load("/definitely/not/here/settings.yaml"),
            Err(SettingsError::Io { .. })
        ));
    }
}
