use std::path::PathBuf;

use thiserror::Error;

use crate::calibration::error::CalibrationError;

///
/// All errors emitted while loading a settings document.
/// The error messages are shown to the operator as-is.
///
/// - `Io`: When the settings file cannot be read
///     Parameters:
///     - `path`: The settings file path
///     - `source`: The underlying I/O error
/// - `Yaml`: When the document is not valid YAML
/// - `Json`: When the document is not valid JSON
/// - `MissingField`: When a required value is absent or not a number
///     Parameters:
///     - `field`: The dotted path of the value, e.g. `limits.upper[2]`
/// - `Calibration`: When the measurements in the document cannot be solved
///
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Could not read settings file {}: {}", .path.display(), .source)]
    Io { path: PathBuf, source: std::io::Error },

    #[error("Settings document is not valid YAML: {}", .0)]
    Yaml(#[from] serde_yaml::Error),

    #[error("Settings document is not valid JSON: {}", .0)]
    Json(#[from] serde_json::Error),

    #[error("Settings document is missing the numeric value `{}`", .field)]
    MissingField { field: String },

    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}
