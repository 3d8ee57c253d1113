//!
//! Calibration solver: measurements to inter-axis angles to correction matrix
//!
//! The physical axes share an origin. The first physical axis is parallel to X and the
//! first two physical axes span the XY plane. `angle_ab` is the angle between the first and
//! second axis, `angle_ac` between the first and third, `angle_bc` between the second and third.
//!

pub mod error;
pub mod math;

use std::f64::consts::PI;

use nalgebra::{Matrix3, Vector3};
use serde::Serialize;
use tracing::info;

use error::CalibrationError;

///
/// The raw measurements taken on the machine. All values are in millimetres.
///
/// # Fields:
/// - `side_x`: The nominal move along X
/// - `side_y`: The nominal move along Y
/// - `diagonal_from_x0y0`: The measured diagonal of the parallelogram spanned by the two moves,
/// originating at x, y = 0
/// - `height`: The nominal move along Z
/// - `z_to_x`: The offset measured on the X axis after the Z move
/// - `z_to_y`: The offset measured on the Y axis after the Z move
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationInput {
    pub side_x: f64,
    pub side_y: f64,
    pub diagonal_from_x0y0: f64,
    pub height: f64,
    pub z_to_x: f64,
    pub z_to_y: f64,
}

impl CalibrationInput {
    fn validate(&self) -> Result<(), CalibrationError> {
        let fields = [
            ("side_x", self.side_x),
            ("side_y", self.side_y),
            ("diagonal_from_x0y0", self.diagonal_from_x0y0),
            ("height", self.height),
            ("z_to_x", self.z_to_x),
            ("z_to_y", self.z_to_y),
        ];

        for (name, value) in fields {
            if !value.is_finite() {
                return Err(CalibrationError::invalid(format!("{} is not a finite number", name)));
            }
        }

        // the z offsets may legitimately be zero or negative, the lengths may not
        for (name, value) in &fields[..4] {
            if *value <= 0. {
                return Err(CalibrationError::invalid(format!("{} must be positive, got {}", name, value)));
            }
        }

        Ok(())
    }
}

///
/// The three angles between the physical axes, in radians, each strictly inside (0, π).
///
#[derive(Debug, Clone, Copy, PartialEq, getset::CopyGetters)]
#[getset(get_copy = "pub")]
pub struct InterAxisAngles {
    angle_ab: f64,
    angle_ac: f64,
    angle_bc: f64,
}

impl InterAxisAngles {
    ///
    /// Creates a set of angles, checking each lies strictly inside (0, π).
    ///
    /// # Parameters:
    /// - `angle_ab`: The angle between the first and second axis
    /// - `angle_ac`: The angle between the first and third axis
    /// - `angle_bc`: The angle between the second and third axis
    ///
    /// # Returns:
    /// - The angles
    /// - An `InvalidCalibration` error naming the first angle out of range
    ///
    pub fn new(angle_ab: f64, angle_ac: f64, angle_bc: f64) -> Result<InterAxisAngles, CalibrationError> {
        for (name, angle) in [("angle_ab", angle_ab), ("angle_ac", angle_ac), ("angle_bc", angle_bc)] {
            if !(angle > 0. && angle < PI) {
                return Err(CalibrationError::invalid(format!(
                    "{} = {} rad is outside (0, π)",
                    name, angle
                )));
            }
        }

        Ok(InterAxisAngles { angle_ab, angle_ac, angle_bc })
    }

    /// A perfectly square machine.
    pub fn orthogonal() -> InterAxisAngles {
        InterAxisAngles { angle_ab: PI / 2., angle_ac: PI / 2., angle_bc: PI / 2. }
    }

    ///
    /// Derives the angles from the measurements. The XY angle comes from solving the
    /// parallelogram, the two Z angles from right triangles.
    ///
    /// # Parameters:
    /// - `input`: The calibration measurements
    ///
    /// # Returns:
    /// - The angles
    /// - An `InvalidCalibration` error if the measurements are impossible
    ///
    pub fn from_input(input: &CalibrationInput) -> Result<InterAxisAngles, CalibrationError> {
        input.validate()?;

        let a = input.side_x;
        let b = input.side_y;
        let q = input.diagonal_from_x0y0;

        // w extends a so that b, a + w and q form a right triangle
        let w = (q.powi(2) - (a.powi(2) + b.powi(2))) / (2. * a);

        info!("--- x,y plane ---");
        info!("nominal move in x direction:     {:.3}", a);
        info!("nominal move in y direction:     {:.3}", b);
        info!("diagonal originating in x,y=0:   {:.3}", q);
        info!("y move projected to x axis:      {:.3}", w);

        let ratio = w / b;
        if !(-1. ..=1.).contains(&ratio) {
            return Err(CalibrationError::invalid(format!(
                "diagonal {:.3} cannot close a parallelogram with sides {:.3} and {:.3}",
                q, a, b
            )));
        }
        let angle_ab = ratio.acos();
        info!("angle between x and y:           {:.3}", angle_ab.to_degrees());

        let h = input.height;
        let angle_ac = h.atan2(input.z_to_x);
        let angle_bc = h.atan2(input.z_to_y);

        info!("--- x,z and y,z plane ---");
        info!("nominal move in z direction:     {:.3}", h);
        info!("offset on x axis:                {:.3}", input.z_to_x);
        info!("angle between x and z:           {:.3}", angle_ac.to_degrees());
        info!("offset on y axis:                {:.3}", input.z_to_y);
        info!("angle between y and z:           {:.3}", angle_bc.to_degrees());

        InterAxisAngles::new(angle_ab, angle_ac, angle_bc)
    }

    ///
    /// # Returns:
    /// - The angles `[ab, ac, bc]` in degrees
    ///
    pub fn degrees(&self) -> [f64; 3] {
        [self.angle_ab.to_degrees(), self.angle_ac.to_degrees(), self.angle_bc.to_degrees()]
    }
}

///
/// Maps nominal program coordinates onto corrected machine coordinates.
/// It is the inverse of the oblique basis built from `InterAxisAngles`.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionMatrix {
    matrix: Matrix3<f64>,
}

impl CorrectionMatrix {
    /// No correction at all.
    pub fn identity() -> CorrectionMatrix {
        CorrectionMatrix { matrix: Matrix3::identity() }
    }

    ///
    /// Builds the correction from already derived angles.
    ///
    /// # Parameters:
    /// - `angles`: The inter-axis angles
    ///
    /// # Returns:
    /// - The correction matrix
    /// - An `InvalidCalibration` error if the basis is singular
    ///
    pub fn from_angles(angles: &InterAxisAngles) -> Result<CorrectionMatrix, CalibrationError> {
        let basis = math::basis_matrix(angles)?;

        match math::invert(&basis) {
            Some(matrix) => Ok(CorrectionMatrix { matrix }),
            None => Err(CalibrationError::invalid("the axis basis is singular and cannot be inverted")),
        }
    }

    ///
    /// Corrects a nominal position.
    ///
    /// # Parameters:
    /// - `nominal`: The programmed X, Y, Z position
    ///
    /// # Returns:
    /// - The unrounded corrected position
    ///
    pub fn apply(&self, nominal: &Vector3<f64>) -> Vector3<f64> {
        math::apply(&self.matrix, nominal)
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    pub fn rows(&self) -> [[f64; 3]; 3] {
        let m = &self.matrix;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }
}

///
/// Solves the calibration: measurements in, correction matrix out.
///
/// # Parameters:
/// - `input`: The calibration measurements
///
/// # Returns:
/// - The correction matrix
/// - An `InvalidCalibration` error if any angle is out of range or the basis is singular
///
pub fn solve(input: &CalibrationInput) -> Result<CorrectionMatrix, CalibrationError> {
    let angles = InterAxisAngles::from_input(input)?;
    CorrectionMatrix::from_angles(&angles)
}

///
/// A printable summary of a solved calibration.
///
/// # Fields:
/// - `angles_deg`: `[ab, ac, bc]` in degrees
/// - `matrix`: The correction matrix, row by row
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationReport {
    pub angles_deg: [f64; 3],
    pub matrix: [[f64; 3]; 3],
}

impl CalibrationReport {
    ///
    /// Solves the calibration and keeps the intermediate angles for display.
    ///
    pub fn from_input(input: &CalibrationInput) -> Result<CalibrationReport, CalibrationError> {
        let angles = InterAxisAngles::from_input(input)?;
        let correction = CorrectionMatrix::from_angles(&angles)?;

        Ok(CalibrationReport { angles_deg: angles.degrees(), matrix: correction.rows() })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn square_input() -> CalibrationInput {
        CalibrationInput {
            side_x: 100.,
            side_y: 100.,
            diagonal_from_x0y0: 141.421,
            height: 100.,
            z_to_x: 0.,
            z_to_y: 0.,
        }
    }

    #[test]
    fn right_angle_gives_identity() {
        let angles = InterAxisAngles::from_input(&square_input()).unwrap();
        assert_relative_eq!(angles.angle_ab(), PI / 2., epsilon = 1e-5);

        let correction = solve(&square_input()).unwrap();
        assert_relative_eq!(*correction.matrix(), Matrix3::identity(), epsilon = 1e-4);
    }

    #[test]
    fn correction_inverts_basis() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..200 {
            let input = CalibrationInput {
                side_x: rng.random_range(50. ..500.),
                side_y: rng.random_range(50. ..500.),
                diagonal_from_x0y0: 0.,
                height: rng.random_range(20. ..200.),
                z_to_x: rng.random_range(-2. ..2.),
                z_to_y: rng.random_range(-2. ..2.),
            };
            // a diagonal for an angle within a few degrees of square
            let gamma: f64 = rng.random_range(1.5..1.65);
            let q = (input.side_x.powi(2) + input.side_y.powi(2)
                + 2. * input.side_x * input.side_y * gamma.cos())
            .sqrt();
            let input = CalibrationInput { diagonal_from_x0y0: q, ..input };

            let angles = InterAxisAngles::from_input(&input).unwrap();
            assert_relative_eq!(angles.angle_ab(), gamma, epsilon = 1e-9);

            let basis = math::basis_matrix(&angles).unwrap();
            let correction = CorrectionMatrix::from_angles(&angles).unwrap();
            assert_relative_eq!(correction.matrix() * basis, Matrix3::identity(), epsilon = 1e-9);
        }
    }

    #[test]
    fn skewed_xy_corrects_y_into_x() {
        // y leans towards +x: a programmed pure y move must be pulled back in x
        let input = CalibrationInput { diagonal_from_x0y0: 142.5, ..square_input() };
        let angles = InterAxisAngles::from_input(&input).unwrap();
        assert!(angles.angle_ab() < PI / 2.);

        let corrected = solve(&input).unwrap().apply(&Vector3::new(0., 100., 0.));
        assert!(corrected.x < 0.);
        assert!(corrected.y > 100.);
    }

    #[test]
    fn tilted_z_uses_offsets() {
        let input = CalibrationInput { z_to_x: 1., z_to_y: -0.5, ..square_input() };
        let angles = InterAxisAngles::from_input(&input).unwrap();
        assert_relative_eq!(angles.angle_ac(), 100f64.atan2(1.), epsilon = 1e-12);
        assert_relative_eq!(angles.angle_bc(), 100f64.atan2(-0.5), epsilon = 1e-12);
        assert!(solve(&input).is_ok());
    }

    #[test]
    fn impossible_diagonal_is_rejected() {
        let input = CalibrationInput { diagonal_from_x0y0: 250., ..square_input() };
        assert!(matches!(solve(&input), Err(CalibrationError::InvalidCalibration { .. })));
    }

    #[test]
    fn degenerate_parallelogram_is_rejected() {
        // q = a + b folds the parallelogram flat, angle_ab = 0
        let input = CalibrationInput { diagonal_from_x0y0: 200., ..square_input() };
        assert!(solve(&input).is_err());
    }

    #[test]
    fn non_positive_lengths_are_rejected() {
        assert!(solve(&CalibrationInput { side_x: 0., ..square_input() }).is_err());
        assert!(solve(&CalibrationInput { height: -1., ..square_input() }).is_err());
        assert!(solve(&CalibrationInput { side_y: f64::NAN, ..square_input() }).is_err());
    }

    #[test]
    fn angles_outside_range_are_rejected() {
        assert!(InterAxisAngles::new(0., 1., 1.).is_err());
        assert!(InterAxisAngles::new(1., PI, 1.).is_err());
        assert!(InterAxisAngles::new(1., 1., f64::NAN).is_err());
        assert!(InterAxisAngles::new(1., 1., 1.).is_ok());
    }

    #[test]
    fn report_holds_degrees_and_rows() {
        let report = CalibrationReport::from_input(&square_input()).unwrap();
        for angle in report.angles_deg {
            assert_relative_eq!(angle, 90., epsilon = 1e-3);
        }
        assert_relative_eq!(report.matrix[2][2], 1., epsilon = 1e-4);
    }
}
