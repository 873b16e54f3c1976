//! Per-instance matcher state: the expected value, the actual value, and the
//! region the instance is currently deciding in.

use crate::resolution::RegionId;
use crate::Value;

/// The expected value a matcher was constructed with.
///
/// `Undefined` is the marker for "no expected value was supplied". It is a
/// separate variant, so no [`Value`] (not even [`Value::Nil`]) is ever equal
/// to it.
///
/// ```
/// use arbiter::{Expected, Value, UNDEFINED};
///
/// assert!(UNDEFINED.is_undefined());
/// assert!(!Expected::from(Value::Nil).is_undefined());
/// assert_ne!(Expected::from(Value::Nil), UNDEFINED);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Expected {
    /// No expected value was supplied.
    #[default]
    Undefined,
    /// An expected value was supplied, possibly [`Value::Nil`].
    Defined(Value),
}

/// The undefined marker.
pub const UNDEFINED: Expected = Expected::Undefined;

impl Expected {
    #[inline]
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Returns the supplied value, or `None` when undefined.
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Undefined => None,
            Self::Defined(v) => Some(v),
        }
    }
}

impl From<Value> for Expected {
    fn from(value: Value) -> Self {
        Self::Defined(value)
    }
}

impl From<Option<Value>> for Expected {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Self::Undefined, Self::Defined)
    }
}

static NIL: Value = Value::Nil;

/// State every matcher embeds and exposes through
/// [`Matcher::state`](crate::Matcher::state).
///
/// `expected` is fixed at construction. `actual` and the active region are
/// written only by [`matches`](crate::MatcherExt::matches).
#[derive(Debug, Clone, Default)]
pub struct MatcherState {
    expected: Expected,
    actual: Option<Value>,
    region: Option<RegionId>,
}

impl MatcherState {
    /// Create state holding `expected`.
    #[must_use]
    pub fn new(expected: impl Into<Expected>) -> Self {
        Self {
            expected: expected.into(),
            actual: None,
            region: None,
        }
    }

    #[must_use]
    pub fn expected(&self) -> &Expected {
        &self.expected
    }

    /// The value under test. Reads as [`Value::Nil`] before the first
    /// `matches` call.
    #[must_use]
    pub fn actual(&self) -> &Value {
        self.actual.as_ref().unwrap_or(&NIL)
    }

    /// Whether `matches` has stored an actual value yet.
    #[must_use]
    pub fn has_actual(&self) -> bool {
        self.actual.is_some()
    }

    #[must_use]
    pub fn is_undefined(&self) -> bool {
        self.expected.is_undefined()
    }

    /// The region `resolve`/`reject` currently target, if a decision is running.
    #[must_use]
    pub fn active_region(&self) -> Option<RegionId> {
        self.region
    }

    pub(crate) fn set_actual(&mut self, actual: Value) {
        self.actual = Some(actual);
    }

    /// Mark `region` active and return the previously active one.
    pub(crate) fn enter(&mut self, region: RegionId) -> Option<RegionId> {
        self.region.replace(region)
    }

    pub(crate) fn leave(&mut self, previous: Option<RegionId>) {
        self.region = previous;
    }
}
