//! `Matcher` - The hook contract, and the entry point that drives it
//!
//! A concrete matcher embeds a [`MatcherState`], implements [`Matcher`], and
//! overrides whichever hooks it needs. Callers never invoke the decision hooks
//! directly: they call [`MatcherExt::matches`], which stores `actual`, opens a
//! resolution region, runs the decision, and always runs [`Matcher::clean_up`].

use std::fmt::Debug;

use crate::resolution::{Decision, Escape, Region, Resolution};
use crate::{Expected, MatcherError, MatcherState, Value};

/// The matcher protocol.
///
/// Only [`state`](Self::state) and [`state_mut`](Self::state_mut) are required.
/// A matcher implements exactly one decision hook:
///
/// - [`match_value`](Self::match_value) receives the value under test, or
/// - [`match_actual`](Self::match_actual) takes no argument and reads
///   [`actual`](Self::actual) instead.
///
/// The entry point always calls `match_value`; its default forwards to
/// `match_actual`, whose default fails with [`MatcherError::NotImplemented`].
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a built [`Registry`](crate::Registry)
/// can hand matchers to any thread. Each instance still belongs to one
/// evaluation at a time.
///
/// # Example
///
/// ```
/// use arbiter::prelude::*;
///
/// #[derive(Debug, Default)]
/// struct Positive {
///     state: MatcherState,
/// }
///
/// impl Matcher for Positive {
///     fn state(&self) -> &MatcherState {
///         &self.state
///     }
///
///     fn state_mut(&mut self) -> &mut MatcherState {
///         &mut self.state
///     }
///
///     fn match_actual(&mut self) -> Decision {
///         let Some(n) = self.actual().as_int() else {
///             return self.reject();
///         };
///         Ok(n > 0)
///     }
/// }
///
/// let mut m = Positive::default();
/// assert_eq!(m.matches(Value::Int(3)), Ok(true));
/// assert_eq!(m.matches(Value::from("3")), Ok(false));
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Matcher`",
    label = "this type cannot be used as a matcher",
    note = "embed a `MatcherState`, implement `state`/`state_mut`, and override `match_value` or `match_actual`"
)]
pub trait Matcher: Send + Sync + Debug {
    /// Shared state: expected value, actual value, active region.
    fn state(&self) -> &MatcherState;

    /// Mutable access to the shared state.
    fn state_mut(&mut self) -> &mut MatcherState;

    /// One-argument decision hook.
    ///
    /// `actual` equals the value passed to `matches`, which is also available
    /// through [`actual`](Self::actual).
    ///
    /// # Errors
    ///
    /// Return [`MatcherError`]s (via `?`) to fail the assertion, or an early
    /// verdict from [`resolve`](Self::resolve) / [`reject`](Self::reject).
    fn match_value(&mut self, actual: &Value) -> Decision {
        let _ = actual;
        self.match_actual()
    }

    /// Zero-argument decision hook.
    ///
    /// # Errors
    ///
    /// Fails with [`MatcherError::NotImplemented`] unless overridden.
    fn match_actual(&mut self) -> Decision {
        Err(MatcherError::NotImplemented { hook: "match" }.into())
    }

    /// One-line statement of intent, e.g. `"be empty"`.
    ///
    /// # Errors
    ///
    /// Fails with [`MatcherError::NotImplemented`] unless overridden.
    fn description(&self) -> Result<String, MatcherError> {
        Err(MatcherError::NotImplemented {
            hook: "description",
        })
    }

    /// Explains a `false` verdict when `true` was expected.
    ///
    /// # Errors
    ///
    /// Fails with [`MatcherError::NotImplemented`] unless overridden.
    fn failure_message(&self) -> Result<String, MatcherError> {
        Err(MatcherError::NotImplemented {
            hook: "failure_message",
        })
    }

    /// Explains a `true` verdict when `false` was expected.
    ///
    /// # Errors
    ///
    /// Fails with [`MatcherError::NotImplemented`] unless overridden.
    fn failure_message_when_negated(&self) -> Result<String, MatcherError> {
        Err(MatcherError::NotImplemented {
            hook: "failure_message_when_negated",
        })
    }

    /// Whether the caller should diff `expected` against `actual` on failure.
    fn diffable(&self) -> bool {
        false
    }

    /// Whether `actual` may be a [`Value::Deferred`].
    fn supports_block_expectations(&self) -> bool {
        false
    }

    /// Runs after every decision, however it ended.
    ///
    /// # Errors
    ///
    /// An error here fails `matches` unless the decision already failed.
    fn clean_up(&mut self) -> Result<(), MatcherError> {
        Ok(())
    }

    // ── Provided accessors ───────────────────────────────────────────────────

    /// The value supplied at construction.
    fn expected(&self) -> &Expected {
        self.state().expected()
    }

    /// The value passed to the current (or last) `matches` call.
    fn actual(&self) -> &Value {
        self.state().actual()
    }

    /// Whether no expected value was supplied.
    fn is_undefined(&self) -> bool {
        self.state().is_undefined()
    }

    /// Stop deciding; the verdict is `true`.
    ///
    /// Use as `return self.resolve()` or `self.resolve()?`.
    ///
    /// # Errors
    ///
    /// Always `Err`: an early verdict inside a decision, or
    /// [`MatcherError::NoActiveRegion`] outside one.
    fn resolve(&self) -> Decision {
        escape(self.state(), "resolve", true)
    }

    /// Stop deciding; the verdict is `false`.
    ///
    /// # Errors
    ///
    /// Always `Err`: an early verdict inside a decision, or
    /// [`MatcherError::NoActiveRegion`] outside one.
    fn reject(&self) -> Decision {
        escape(self.state(), "reject", false)
    }
}

fn escape(state: &MatcherState, operation: &'static str, verdict: bool) -> Decision {
    match state.active_region() {
        Some(region) => Err(Escape::Resolution(Resolution::new(region, verdict))),
        None => Err(MatcherError::NoActiveRegion { operation }.into()),
    }
}

/// The entry point. Blanket-implemented for every [`Matcher`], including
/// `dyn Matcher`, and not meant to be implemented by hand.
pub trait MatcherExt: Matcher {
    /// Decide whether `actual` satisfies this matcher.
    ///
    /// 1. Stores `actual` in the state.
    /// 2. Runs [`Matcher::match_value`] inside a fresh resolution region.
    /// 3. Runs [`Matcher::clean_up`] exactly once, including on panic.
    ///
    /// # Errors
    ///
    /// Returns the decision's failure unchanged, or the cleanup failure when
    /// the decision itself succeeded. An early verdict addressed to another
    /// region becomes [`MatcherError::MisdirectedResolution`].
    fn matches(&mut self, actual: Value) -> Result<bool, MatcherError>;
}

impl<M: Matcher + ?Sized> MatcherExt for M {
    fn matches(&mut self, actual: Value) -> Result<bool, MatcherError> {
        self.state_mut().set_actual(actual.clone());

        let region = Region::new();
        let region_id = region.id();
        let previous = self.state_mut().enter(region_id);

        let outcome = region.run(
            self,
            |matcher, _| matcher.match_value(&actual),
            |matcher| {
                matcher.state_mut().leave(previous);
                matcher.clean_up()
            },
        );

        match outcome {
            Ok(verdict) => {
                tracing::trace!(matcher = ?self, verdict, "decided");
                Ok(verdict)
            }
            Err(Escape::Failure(err)) => Err(err),
            Err(Escape::Resolution(r)) => {
                tracing::debug!(
                    region = ?region_id,
                    target = ?r.region(),
                    "unmatched early verdict reached the entry point"
                );
                Err(MatcherError::MisdirectedResolution)
            }
        }
    }
}
