//! `Value` - Type-erased data handed to a matcher
//!
//! Matchers are registered and invoked by name, so the registry cannot know the
//! concrete type each one tests. `Value` erases it: primitives stay inline and
//! domain types ride in the [`Value::Custom`] variant.
//!
//! # Deferred computations
//!
//! [`Value::Deferred`] carries a zero-argument computation instead of a concrete
//! value. Only matchers that report
//! [`supports_block_expectations`](crate::Matcher::supports_block_expectations)
//! should be handed one.

use std::any::Any;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::MatcherError;

/// Extension trait for domain values carried by [`Value::Custom`].
///
/// # Example
///
/// ```
/// use std::any::Any;
/// use std::sync::Arc;
/// use arbiter::{CustomValue, Value};
///
/// #[derive(Debug)]
/// struct Port(u16);
///
/// impl CustomValue for Port {
///     fn custom_type_name(&self) -> &'static str {
///         "port"
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
///
/// let value = Value::Custom(Arc::new(Port(8080)));
/// assert_eq!(value.type_name(), "port");
/// ```
pub trait CustomValue: Send + Sync + Debug {
    /// Returns a `snake_case` type identifier, e.g. `"http_request"`.
    fn custom_type_name(&self) -> &'static str;

    /// Returns `self` as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

type Thunk = dyn Fn() -> Result<Value, MatcherError> + Send + Sync;

/// A zero-argument computation standing in for a concrete value.
///
/// Cloning shares the underlying closure; two `Deferred` are equal only when
/// they share it.
///
/// ```
/// use arbiter::{Deferred, Value};
///
/// let deferred = Deferred::new(|| Ok(Value::Int(7)));
/// assert_eq!(deferred.evaluate(), Ok(Value::Int(7)));
/// ```
#[derive(Clone)]
pub struct Deferred(Arc<Thunk>);

impl Deferred {
    /// Wrap a computation.
    pub fn new(f: impl Fn() -> Result<Value, MatcherError> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Run the computation.
    ///
    /// # Errors
    ///
    /// Returns whatever error the computation produces.
    pub fn evaluate(&self) -> Result<Value, MatcherError> {
        (self.0)()
    }
}

impl Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred(..)")
    }
}

impl PartialEq for Deferred {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// The erased value passed to [`matches`](crate::MatcherExt::matches) and held
/// as a matcher's expected value.
///
/// # Example
///
/// ```
/// use arbiter::Value;
///
/// let value: Value = "hello".into();
/// assert_eq!(value.as_str(), Some("hello"));
/// assert!(!value.is_nil());
/// assert!(Value::from(None::<i64>).is_nil());
/// ```
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absence of a value. Distinct from an undefined expected value.
    #[default]
    Nil,

    /// Boolean.
    Bool(bool),

    /// Signed integer.
    Int(i64),

    /// Floating point number. Compared with `==`, so `NaN` never equals itself.
    Float(f64),

    /// UTF-8 string.
    String(String),

    /// Raw bytes.
    Bytes(Vec<u8>),

    /// Ordered sequence of values.
    List(Vec<Value>),

    /// Domain value, compared by pointer identity.
    Custom(Arc<dyn CustomValue>),

    /// Zero-argument computation, compared by pointer identity.
    Deferred(Deferred),
}

// Custom and Deferred compare by allocation; everything else structurally.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            (Self::Deferred(a), Self::Deferred(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Returns `true` if this is [`Value::Nil`].
    #[inline]
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns `true` if this is [`Value::Deferred`].
    #[inline]
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// Returns `true` if this is [`Value::Custom`].
    #[inline]
    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get the value as a string slice.
    ///
    /// ```
    /// use arbiter::Value;
    ///
    /// assert_eq!(Value::from("x").as_str(), Some("x"));
    /// assert_eq!(Value::Int(1).as_str(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Returns the inner [`CustomValue`]; downcast it via [`CustomValue::as_any`].
    #[inline]
    #[must_use]
    pub fn as_custom(&self) -> Option<&dyn CustomValue> {
        match self {
            Self::Custom(c) => Some(c.as_ref()),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_deferred(&self) -> Option<&Deferred> {
        match self {
            Self::Deferred(d) => Some(d),
            _ => None,
        }
    }

    /// Returns a lowercase tag naming the variant.
    ///
    /// For `Custom`, delegates to [`CustomValue::custom_type_name`].
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Custom(c) => c.custom_type_name(),
            Self::Deferred(_) => "deferred",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<Deferred> for Value {
    fn from(d: Deferred) -> Self {
        Self::Deferred(d)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Nil, Into::into)
    }
}

/// JSON objects have no counterpart and become a list of `[key, value]` pairs,
/// so `{}` and `[]` convert to the same value. The conversion is lossy for
/// objects; fixture loading refuses them.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Nil,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::List(
                map.into_iter()
                    .map(|(k, v)| Self::List(vec![Self::String(k), Self::from(v)]))
                    .collect(),
            ),
        }
    }
}
