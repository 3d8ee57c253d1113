//!
//! Physical machine axes and travel limits
//!

pub mod math;

use std::fmt;

///
/// One of the three linear machine axes. The discriminant order is the order
/// coordinates are stored in vectors and written to output lines.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes, in output order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    ///
    /// # Returns:
    /// - The slot of this axis in a 3-vector
    ///
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    ///
    /// # Returns:
    /// - The uppercase letter used for this axis in a motion program
    ///
    pub fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
        }
    }

    ///
    /// Looks up an axis by its program letter. Only uppercase letters name an axis.
    ///
    /// # Parameters:
    /// - `letter`: The first character of a program token
    ///
    /// # Returns:
    /// - The matching axis, or `None` if the letter is not an axis letter
    ///
    pub fn from_letter(letter: char) -> Option<Axis> {
        match letter {
            'X' => Some(Axis::X),
            'Y' => Some(Axis::Y),
            'Z' => Some(Axis::Z),
            _ => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

///
/// Which side of the envelope was crossed.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Upper,
    Lower,
}

///
/// A corrected coordinate outside the configured travel limits.
///
/// # Fields:
/// - `axis`: The offending axis
/// - `value`: The corrected, rounded coordinate
/// - `bound`: The limit that was crossed
/// - `kind`: Whether `bound` is the upper or lower limit
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitViolation {
    pub axis: Axis,
    pub value: f64,
    pub bound: f64,
    pub kind: LimitKind,
}

impl fmt::Display for LimitViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LimitKind::Upper => write!(
                f,
                "translated axis {} is above upper limit: {:.3} > {:.3}",
                self.axis, self.value, self.bound
            ),
            LimitKind::Lower => write!(
                f,
                "translated axis {} is below lower limit: {:.3} < {:.3}",
                self.axis, self.value, self.bound
            ),
        }
    }
}

///
/// The travel envelope of the machine. Values outside it are reported, never rejected.
/// All fields are measured in millimetres and indexed by `Axis::index`.
///
/// # Fields:
/// - `upper`: The highest permitted corrected coordinate per axis
/// - `lower`: The lowest permitted corrected coordinate per axis
///
#[derive(Debug, Clone, PartialEq, getset::Getters)]
#[get = "pub"]
pub struct AxisLimits {
    upper: [f64; 3],
    lower: [f64; 3],
}

impl AxisLimits {
    ///
    /// Creates a new set of limits.
    ///
    /// # Parameters:
    /// - `upper`: Upper bounds for X, Y and Z
    /// - `lower`: Lower bounds for X, Y and Z
    ///
    /// # Returns:
    /// - A new `AxisLimits` instance
    ///
    pub fn new(upper: [f64; 3], lower: [f64; 3]) -> AxisLimits {
        AxisLimits { upper, lower }
    }

    ///
    /// Limits that never produce a violation.
    ///
    pub fn unbounded() -> AxisLimits {
        AxisLimits { upper: [f64::INFINITY; 3], lower: [f64::NEG_INFINITY; 3] }
    }

    ///
    /// Checks a single corrected coordinate against the envelope.
    ///
    /// # Parameters:
    /// - `axis`: The axis the value belongs to
    /// - `value`: The corrected, rounded coordinate
    ///
    /// # Returns:
    /// - `None` if the value is inside the envelope (bounds inclusive)
    /// - The violated bound otherwise
    ///
    pub fn check(&self, axis: Axis, value: f64) -> Option<LimitViolation> {
        let upper = self.upper[axis.index()];
        let lower = self.lower[axis.index()];

        if value > upper {
            Some(LimitViolation { axis, value, bound: upper, kind: LimitKind::Upper })
        } else if value < lower {
            Some(LimitViolation { axis, value, bound: lower, kind: LimitKind::Lower })
        } else {
            None
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_round_trip() {
        for axis in Axis::ALL {
            assert_eq!(Axis::from_letter(axis.letter()), Some(axis));
        }
        assert_eq!(Axis::from_letter('x'), None);
        assert_eq!(Axis::from_letter('F'), None);
    }

    #[test]
    fn indices_follow_output_order() {
        let indices: Vec<usize> = Axis::ALL.iter().map(|a| a.index()).collect();
        assert_eq!(indices, [0, 1, 2]);
    }

    #[test]
    fn above_upper_limit() {
        let limits = AxisLimits::new([500., 500., 100.], [-10., -10., -10.]);
        let violation = limits.check(Axis::X, 512.345).unwrap();
        assert_eq!(violation.axis, Axis::X);
        assert_eq!(violation.value, 512.345);
        assert_eq!(violation.bound, 500.);
        assert_eq!(violation.kind, LimitKind::Upper);
    }

    #[test]
    fn inside_and_on_bounds() {
        let limits = AxisLimits::new([500., 500., 100.], [-10., -10., -10.]);
        assert!(limits.check(Axis::X, -5.).is_none());
        assert!(limits.check(Axis::X, 500.).is_none());
        assert!(limits.check(Axis::Z, -10.).is_none());
    }

    #[test]
    fn below_lower_limit() {
        let limits = AxisLimits::new([500., 500., 100.], [-10., -10., -10.]);
        let violation = limits.check(Axis::Y, -10.001).unwrap();
        assert_eq!(violation.kind, LimitKind::Lower);
        assert_eq!(violation.bound, -10.);
    }

    #[test]
    fn violation_names_axis_value_and_bound() {
        let limits = AxisLimits::new([500., 500., 100.], [-10., -10., -10.]);
        assert_eq!(
            limits.check(Axis::X, 512.345).unwrap().to_string(),
            "translated axis X is above upper limit: 512.345 > 500.000"
        );
    }

    #[test]
    fn unbounded_never_violates() {
        let limits = AxisLimits::unbounded();
        assert!(limits.check(Axis::Z, 1e12).is_none());
        assert!(limits.check(Axis::Z, -1e12).is_none());
    }
}
