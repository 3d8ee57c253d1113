//!
//! Where advisory warnings go. The caller picks the sink when opening a session.
//!

use tracing::warn;

pub use crate::hardware::{LimitKind, LimitViolation};

///
/// Receives the non-fatal diagnostics produced while transforming lines.
///
pub trait DiagnosticsSink {
    fn limit_violation(&mut self, violation: &LimitViolation);
}

///
/// Forwards every violation to `tracing` at warn level.
///
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn limit_violation(&mut self, violation: &LimitViolation) {
        warn!(axis = %violation.axis, value = violation.value, bound = violation.bound, "{}", violation);
    }
}

impl DiagnosticsSink for Vec<LimitViolation> {
    fn limit_violation(&mut self, violation: &LimitViolation) {
        self.push(*violation);
    }
}

impl<S: DiagnosticsSink + ?Sized> DiagnosticsSink for &mut S {
    fn limit_violation(&mut self, violation: &LimitViolation) {
        (**self).limit_violation(violation);
    }
}

///
/// Wraps another sink and counts what passes through it.
///
/// # Fields:
/// - `inner`: The sink violations are forwarded to
/// - `count`: The number of violations seen so far
///
#[derive(Debug, Default)]
pub struct CountingSink<S> {
    inner: S,
    count: usize,
}

impl<S: DiagnosticsSink> CountingSink<S> {
    pub fn new(inner: S) -> CountingSink<S> {
        CountingSink { inner, count: 0 }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: DiagnosticsSink> DiagnosticsSink for CountingSink<S> {
    fn limit_violation(&mut self, violation: &LimitViolation) {
        self.count += 1;
        self.inner.limit_violation(violation);
    }
}
