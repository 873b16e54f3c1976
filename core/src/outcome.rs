//! The call sequence an assertion framework runs against a matcher.
//!
//! [`assess`] checks block support, takes the verdict, and on failure collects
//! the message and an optional diff request. It returns data only; rendering
//! belongs to the framework.

use crate::{Matcher, MatcherError, MatcherExt, Value};

/// Whether the assertion expects a match (`to`) or no match (`not_to`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expectation {
    #[default]
    Positive,
    Negated,
}

/// Values the framework should diff when reporting a failure.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffRequest {
    pub expected: Value,
    pub actual: Value,
}

/// Result of one assessed assertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// The matcher's verdict.
    pub verdict: bool,
    /// Whether the assertion holds given its [`Expectation`].
    pub passed: bool,
    /// Failure explanation; `None` when passed.
    pub message: Option<String>,
    /// Present when failed, the matcher is diffable, and `expected` is defined.
    pub diff: Option<DiffRequest>,
}

/// Run `matcher` against `actual` the way an assertion framework would.
///
/// ```
/// use arbiter::prelude::*;
/// use arbiter::{assess, Expectation};
///
/// #[derive(Debug, Default)]
/// struct Truthy {
///     state: MatcherState,
/// }
///
/// impl Matcher for Truthy {
///     fn state(&self) -> &MatcherState { &self.state }
///     fn state_mut(&mut self) -> &mut MatcherState { &mut self.state }
///     fn match_value(&mut self, actual: &Value) -> Decision {
///         Ok(!matches!(actual, Value::Nil | Value::Bool(false)))
///     }
///     fn failure_message(&self) -> Result<String, MatcherError> {
///         Ok(format!("expected {:?} to be truthy", self.actual()))
///     }
/// }
///
/// let outcome = assess(&mut Truthy::default(), Value::Nil, Expectation::Positive)?;
/// assert!(!outcome.passed);
/// assert_eq!(outcome.message.as_deref(), Some("expected Nil to be truthy"));
/// # Ok::<(), MatcherError>(())
/// ```
///
/// # Errors
///
/// - [`MatcherError::BlockExpectationUnsupported`] if `actual` is deferred and
///   the matcher does not support block expectations
/// - errors from `matches` or from the failure-message hook
pub fn assess<M>(
    matcher: &mut M,
    actual: Value,
    expectation: Expectation,
) -> Result<Outcome, MatcherError>
where
    M: Matcher + ?Sized,
{
    if actual.is_deferred() && !matcher.supports_block_expectations() {
        return Err(MatcherError::BlockExpectationUnsupported {
            matcher: format!("{matcher:?}"),
        });
    }

    let verdict = matcher.matches(actual)?;
    let passed = match expectation {
        Expectation::Positive => verdict,
        Expectation::Negated => !verdict,
    };

    if passed {
        return Ok(Outcome {
            verdict,
            passed,
            message: None,
            diff: None,
        });
    }

    let message = match expectation {
        Expectation::Positive => matcher.failure_message()?,
        Expectation::Negated => matcher.failure_message_when_negated()?,
    };
    let diff = if matcher.diffable() {
        matcher.expected().value().map(|expected| DiffRequest {
            expected: expected.clone(),
            actual: matcher.actual().clone(),
        })
    } else {
        None
    };

    tracing::debug!(
        ?expectation,
        verdict,
        diff = diff.is_some(),
        "assertion failed"
    );

    Ok(Outcome {
        verdict,
        passed,
        message: Some(message),
        diff,
    })
}
