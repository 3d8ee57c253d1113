//!
//! Line transformer: rewrites axis words of a motion program through the correction matrix
//!

pub mod diagnostics;

use nalgebra::Vector3;
use tracing::debug;

use crate::calibration::CorrectionMatrix;
use crate::hardware::math::{format_axis_word, round_to_resolution};
use crate::hardware::{Axis, AxisLimits};
use crate::program::{Token, tokenize};
use diagnostics::DiagnosticsSink;

///
/// The running position of one processing session.
///
/// # Fields:
/// - `last_nominal`: The last programmed value seen per axis, 0 for axes never mentioned
/// - `last_corrected`: The last corrected position written out, `None` until a line with
/// axis words has been processed
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionState {
    last_nominal: Vector3<f64>,
    last_corrected: Option<Vector3<f64>>,
}

impl PositionState {
    fn new() -> PositionState {
        PositionState { last_nominal: Vector3::zeros(), last_corrected: None }
    }

    pub fn last_nominal(&self) -> &Vector3<f64> {
        &self.last_nominal
    }

    pub fn last_corrected(&self) -> Option<&Vector3<f64>> {
        self.last_corrected.as_ref()
    }
}

///
/// Transforms the lines of one program, in order. Each line's correction depends on the
/// nominal position carried over from every line before it, so a session must never be
/// shared between files or fed lines out of order.
///
/// # Fields:
/// - `correction`: The matrix mapping nominal to corrected coordinates
/// - `limits`: The travel envelope corrected values are checked against
/// - `state`: The running position
/// - `sink`: Where limit violations are reported
/// - `lines`: The number of lines processed so far
///
pub struct Session<S: DiagnosticsSink> {
    correction: CorrectionMatrix,
    limits: AxisLimits,
    state: PositionState,
    sink: S,
    lines: usize,
}

impl<S: DiagnosticsSink> Session<S> {
    ///
    /// Opens a session with a fresh position state.
    ///
    /// # Parameters:
    /// - `correction`: The solved correction matrix
    /// - `limits`: The travel limits used for warnings
    /// - `sink`: Receives limit violations
    ///
    /// # Returns:
    /// - A new `Session`
    ///
    pub fn open(correction: CorrectionMatrix, limits: AxisLimits, sink: S) -> Session<S> {
        Session { correction, limits, state: PositionState::new(), sink, lines: 0 }
    }

    ///
    /// Transforms a single line. Axis words are replaced by a full corrected X, Y, Z triple
    /// placed where the first axis word stood; every other token keeps its relative order.
    /// Lines without any axis word are returned with their tokens joined by single spaces; the
    /// held position is still checked against the limits, but the state is left as it was.
    ///
    /// # Parameters:
    /// - `raw_line`: The line as read from the program, terminator optional
    ///
    /// # Returns:
    /// - The transformed line, without a terminator
    ///
    pub fn process_line(&mut self, raw_line: &str) -> String {
        self.lines += 1;
        debug!("line {}: {}", self.lines, raw_line.trim());

        let tokens = tokenize(raw_line);
        let mut nominal = self.state.last_nominal;
        let mut insertion_idx: Option<usize> = None;
        let mut pass_through: Vec<&str> = Vec::with_capacity(tokens.len());

        for (index, token) in tokens.into_iter().enumerate() {
            match token {
                Token::Axis { axis, value } => {
                    if insertion_idx.is_none() {
                        debug!("first coordinate position in line: {}", index);
                        insertion_idx = Some(index);
                    }
                    nominal[axis.index()] = value;
                }
                Token::PassThrough(text) => pass_through.push(text),
            }
        }

        // the held position is checked on every line, moving or not
        let corrected = self.correction.apply(&nominal).map(round_to_resolution);
        debug!(
            "new nominal position: [{:.3}, {:.3}, {:.3}], corrected: [{:.3}, {:.3}, {:.3}]",
            nominal.x, nominal.y, nominal.z, corrected.x, corrected.y, corrected.z
        );

        self.validate(&corrected);

        // nothing to rewrite
        let Some(insertion_idx) = insertion_idx else {
            return pass_through.join(" ");
        };

        // everything ahead of the first axis word is a pass-through token
        let (before, after) = pass_through.split_at(insertion_idx);
        let mut out: Vec<String> = Vec::with_capacity(pass_through.len() + Axis::ALL.len());
        out.extend(before.iter().map(|t| t.to_string()));
        out.extend(Axis::ALL.map(|axis| format_axis_word(axis, corrected[axis.index()])));
        out.extend(after.iter().map(|t| t.to_string()));

        self.state.last_nominal = nominal;
        self.state.last_corrected = Some(corrected);

        out.join(" ")
    }

    fn validate(&mut self, corrected: &Vector3<f64>) {
        for axis in Axis::ALL {
            if let Some(violation) = self.limits.check(axis, corrected[axis.index()]) {
                self.sink.limit_violation(&violation);
            }
        }
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn lines_processed(&self) -> usize {
        self.lines
    }

    ///
    /// Ends the session. The position state is discarded; the sink is handed back.
    ///
    pub fn close(self) -> S {
        debug!("session closed after {} lines", self.lines);
        self.sink
    }
}
