//!
//! Skew correction for motion programs on machines whose X, Y and Z axes are not perpendicular.
//!
//! Calibration measurements are solved once into a correction matrix; every axis word of a
//! program is then remapped through it, line by line, while all other tokens pass through.
//!
//! ```
//! use skewcorr::calibration::CorrectionMatrix;
//! use skewcorr::hardware::AxisLimits;
//! use skewcorr::transform::{Session, diagnostics::TracingSink};
//!
//! let mut session = Session::open(CorrectionMatrix::identity(), AxisLimits::unbounded(), TracingSink);
//! assert_eq!(session.process_line("G1 X10 Y20 F100"), "G1 X10.000 Y20.000 Z0.000 F100");
//! ```
//!

pub mod calibration;
pub mod convert;
pub mod hardware;
pub mod program;
pub mod settings;
pub mod transform;
