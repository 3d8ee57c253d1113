//!
//! Small 3×3 linear algebra used by the calibration solver.
//!

use nalgebra::{Matrix3, Vector3};

use super::InterAxisAngles;
use super::error::CalibrationError;

/// Determinants and pivots smaller than this are treated as zero.
pub const SINGULARITY_EPS: f64 = 1e-12;

///
/// Builds the oblique basis from the inter-axis angles. Each column is a physical axis
/// unit vector expressed in orthogonal coordinates, with the first physical axis
/// aligned to the first orthogonal axis and the second lying in the first plane.
///
/// # Parameters:
/// - `angles`: The three inter-axis angles, in radians
///
/// # Returns:
/// - The basis matrix
/// - An error if the angles cannot describe three independent axes
///
pub fn basis_matrix(angles: &InterAxisAngles) -> Result<Matrix3<f64>, CalibrationError> {
    let (sin_ab, cos_ab) = angles.angle_ab().sin_cos();
    let cos_ac = angles.angle_ac().cos();
    let cos_bc = angles.angle_bc().cos();

    if sin_ab.abs() < SINGULARITY_EPS {
        return Err(CalibrationError::invalid("the x and y axes are parallel"));
    }

    let t_y = (cos_bc - cos_ac * cos_ab) / sin_ab;
    let radicand = 1. - cos_ac.powi(2) - t_y.powi(2);

    if !radicand.is_finite() || radicand < SINGULARITY_EPS {
        return Err(CalibrationError::invalid(format!(
            "the z axis cannot be placed for these angles (radicand {:.6})",
            radicand
        )));
    }

    Ok(Matrix3::new(
        1., cos_ab, cos_ac,
        0., sin_ab, t_y,
        0., 0., radicand.sqrt(),
    ))
}

///
/// Inverts a 3×3 matrix, refusing to produce NaN or infinite entries.
///
/// # Parameters:
/// - `matrix`: The matrix to invert
///
/// # Returns:
/// - The inverse, or `None` if the matrix is singular or the result is not finite
///
pub fn invert(matrix: &Matrix3<f64>) -> Option<Matrix3<f64>> {
    if !matrix.iter().all(|v| v.is_finite()) {
        return None;
    }

    if matrix.determinant().abs() < SINGULARITY_EPS {
        return None;
    }

    let inverse = matrix.try_inverse()?;
    if inverse.iter().all(|v| v.is_finite()) {
        Some(inverse)
    } else {
        None
    }
}

///
/// # Returns:
/// - `matrix * vector`
///
pub fn apply(matrix: &Matrix3<f64>, vector: &Vector3<f64>) -> Vector3<f64> {
    matrix * vector
}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn orthogonal_angles_give_identity_basis() {
        let basis = basis_matrix(&InterAxisAngles::orthogonal()).unwrap();
        assert_relative_eq!(basis, Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn basis_columns_are_unit_vectors() {
        let angles = InterAxisAngles::new(1.5, 1.52, 1.6).unwrap();
        let basis = basis_matrix(&angles).unwrap();
        for column in basis.column_iter() {
            assert_relative_eq!(column.norm(), 1., epsilon = 1e-12);
        }
    }

    #[test]
    fn basis_columns_keep_the_angles() {
        let angles = InterAxisAngles::new(1.5, 1.52, 1.6).unwrap();
        let basis = basis_matrix(&angles).unwrap();
        let (a, b, c) = (basis.column(0), basis.column(1), basis.column(2));
        assert_relative_eq!(a.dot(&b).acos(), 1.5, epsilon = 1e-12);
        assert_relative_eq!(a.dot(&c).acos(), 1.52, epsilon = 1e-12);
        assert_relative_eq!(b.dot(&c).acos(), 1.6, epsilon = 1e-12);
    }

    #[test]
    fn impossible_z_axis_is_rejected() {
        // x and y almost aligned while z sits far from both cannot close the triangle
        let angles = InterAxisAngles::new(0.1, FRAC_PI_2, 0.2).unwrap();
        assert!(basis_matrix(&angles).is_err());
    }

    #[test]
    fn singular_matrix_is_not_inverted() {
        let singular = Matrix3::new(1., 2., 3., 2., 4., 6., 0., 0., 1.);
        assert!(invert(&singular).is_none());
    }

    #[test]
    fn non_finite_matrix_is_not_inverted() {
        let mut matrix = Matrix3::identity();
        matrix[(1, 1)] = f64::NAN;
        assert!(invert(&matrix).is_none());
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let matrix = Matrix3::new(1., 0.01, -0.02, 0., 0.9999, 0.003, 0., 0., 0.998);
        let inverse = invert(&matrix).unwrap();
        assert_relative_eq!(inverse * matrix, Matrix3::identity(), epsilon = 1e-12);
    }
}
