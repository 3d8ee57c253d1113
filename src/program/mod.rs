//!
//! Motion program line tokenizing
//!
//! Only axis words matter to the correction. Every other token is carried through untouched.
//!

use crate::hardware::Axis;

///
/// A single whitespace-separated token of a program line.
///
/// # Variants:
/// - `Axis`: An axis letter immediately followed by a signed decimal, e.g. `X-12.5`
/// - `PassThrough`: Anything else, copied to the output byte-for-byte
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'a> {
    Axis { axis: Axis, value: f64 },
    PassThrough(&'a str),
}

///
/// Splits a line on runs of whitespace and classifies each token.
///
/// # Parameters:
/// - `line`: One line of a motion program, with or without its line terminator
///
/// # Returns:
/// - The tokens, in line order
///
pub fn tokenize(line: &str) -> Vec<Token<'_>> {
    line.split_whitespace().map(classify).collect()
}

///
/// Classifies a single token. A token that starts with an axis letter but whose
/// remainder is not a plain signed decimal is passed through rather than rejected.
///
pub fn classify(token: &str) -> Token<'_> {
    match parse_axis_word(token) {
        Some((axis, value)) => Token::Axis { axis, value },
        None => Token::PassThrough(token),
    }
}

///
/// Parses an axis word.
///
/// # Parameters:
/// - `token`: A single token without whitespace
///
/// # Returns:
/// - The axis and its value, or `None` if the token is not an axis word
///
pub fn parse_axis_word(token: &str) -> Option<(Axis, f64)> {
    let mut chars = token.chars();
    let axis = Axis::from_letter(chars.next()?)?;
    let literal = chars.as_str();

    if !is_signed_decimal(literal) {
        return None;
    }

    // overflowing literals parse to infinity and are not coordinates
    literal.parse::<f64>().ok().filter(|value| value.is_finite()).map(|value| (axis, value))
}

///
/// Accepts `[+-]?digits[.digits]`, `[+-]?digits.` and `[+-]?.digits`.
/// Exponents, `inf` and `nan` are rejected even though `f64::from_str` accepts them.
///
fn is_signed_decimal(literal: &str) -> bool {
    let unsigned = literal.strip_prefix(['+', '-']).unwrap_or(literal);

    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (unsigned, ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());

    all_digits(integer) && all_digits(fraction) && !(integer.is_empty() && fraction.is_empty())
}
