use super::Axis;

/// The number of decimal places the machine controller accepts.
pub const DECIMALS: i32 = 3;

///
/// Rounds a coordinate to the machine's output resolution of 0.001 mm.
/// Ties are rounded away from zero, and a negative zero result becomes positive zero.
///
/// Ties are judged on the scaled value `value * 1000`, not on the exact binary value of
/// `value`. A literal like `1.0005` is stored slightly below the tie, but its product with
/// 1000 rounds to exactly `1000.5`, so it rounds up to `1.001`.
///
/// # Parameters:
/// - `value`: The raw coordinate, in millimetres
///
/// # Returns:
/// - The coordinate rounded to three decimal places
///
pub fn round_to_resolution(value: f64) -> f64 {
    let scale = f64::powi(10., DECIMALS);
    let rounded = (value * scale).round() / scale;

    // -0.0 + 0.0 == +0.0
    rounded + 0.
}

///
/// Formats an axis word, e.g. `X-1.250`. The value is written fixed-point
/// with three decimals and a leading `-` only when negative.
///
/// # Parameters:
/// - `axis`: The axis to write the letter for
/// - `value`: The coordinate, already rounded
///
/// # Returns:
/// - The axis word as it appears in the output program
///
pub fn format_axis_word(axis: Axis, value: f64) -> String {
    format!("{}{:.*}", axis.letter(), DECIMALS as usize, value)
}
