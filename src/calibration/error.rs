use thiserror::Error;

/// All errors emitted from the calibration module.
///
/// - `InvalidCalibration`: When the measurements are geometrically impossible, or produce a
/// basis that cannot be inverted
///     Parameters:
///     - `reason`: What was wrong with the measurements
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("Invalid calibration: {}", .reason)]
    InvalidCalibration { reason: String },
}

impl CalibrationError {
    pub(crate) fn invalid(reason: impl Into<String>) -> CalibrationError {
        CalibrationError::InvalidCalibration { reason: reason.into() }
    }
}
