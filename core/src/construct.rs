//! Two-phase matcher construction
//!
//! Phase one is generic: take the first argument as `expected` (or leave the
//! undefined marker), resolve the options, and pack the rest into [`Args`].
//! Phase two is the implementer's own initializer, [`Construct::construct`],
//! which receives all three.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::{Expected, Matcher, MatcherError, MatcherState, Namespace, Value};

type BlockFn = dyn Fn(&[Value]) -> Result<Value, MatcherError> + Send + Sync;

/// A trailing callable handed to a matcher's initializer.
///
/// ```
/// use arbiter::{Block, Value};
///
/// let double = Block::new(|args| Ok(Value::Int(args[0].as_int().unwrap_or(0) * 2)));
/// assert_eq!(double.call(&[Value::Int(4)]), Ok(Value::Int(8)));
/// ```
#[derive(Clone)]
pub struct Block(Arc<BlockFn>);

impl Block {
    pub fn new(
        f: impl Fn(&[Value]) -> Result<Value, MatcherError> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(f))
    }

    /// Invoke the callable.
    ///
    /// # Errors
    ///
    /// Returns whatever error the callable produces.
    pub fn call(&self, args: &[Value]) -> Result<Value, MatcherError> {
        (self.0)(args)
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Block(..)")
    }
}

/// Arguments left over after `expected` has been taken.
#[derive(Debug, Clone, Default)]
pub struct Args {
    rest: Vec<Value>,
    block: Option<Block>,
}

impl Args {
    /// Remaining positional arguments, in call order.
    #[must_use]
    pub fn rest(&self) -> &[Value] {
        &self.rest
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.rest.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rest.len()
    }

    /// No positional arguments. The block is not counted, as in [`len`](Self::len).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    #[must_use]
    pub fn block(&self) -> Option<&Block> {
        self.block.as_ref()
    }

    /// Split into positional values and the block.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Value>, Option<Block>) {
        (self.rest, self.block)
    }
}

/// Everything a factory call carries: `(expected?, *rest, &block)`.
///
/// ```
/// use arbiter::{Invocation, Value};
///
/// let call = Invocation::expecting(5).arg("extra");
/// assert_eq!(call.expected().value(), Some(&Value::Int(5)));
/// assert!(Invocation::new().expected().is_undefined());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    expected: Expected,
    args: Args,
}

impl Invocation {
    /// A call with no arguments: `expected` stays undefined.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A call whose first argument is `expected`.
    pub fn expecting(expected: impl Into<Value>) -> Self {
        Self {
            expected: Expected::Defined(expected.into()),
            args: Args::default(),
        }
    }

    /// Append a positional argument after `expected`.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.rest.push(value.into());
        self
    }

    /// Attach the trailing callable.
    #[must_use]
    pub fn block(
        mut self,
        f: impl Fn(&[Value]) -> Result<Value, MatcherError> + Send + Sync + 'static,
    ) -> Self {
        self.args.block = Some(Block::new(f));
        self
    }

    #[must_use]
    pub fn expected(&self) -> &Expected {
        &self.expected
    }

    #[must_use]
    pub fn args(&self) -> &Args {
        &self.args
    }

    #[must_use]
    pub fn into_parts(self) -> (Expected, Args) {
        (self.expected, self.args)
    }
}

/// Options type for matchers that take none. Rejects every key.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoOptions {}

/// Construction and registration for a concrete matcher type.
///
/// # Example
///
/// ```
/// use arbiter::prelude::*;
/// use serde::Deserialize;
///
/// #[derive(Debug, Clone, Default, Deserialize)]
/// #[serde(deny_unknown_fields)]
/// struct LengthOptions {
///     #[serde(default)]
///     strict: bool,
/// }
///
/// #[derive(Debug)]
/// struct HaveLength {
///     state: MatcherState,
///     strict: bool,
/// }
///
/// impl Matcher for HaveLength {
///     fn state(&self) -> &MatcherState { &self.state }
///     fn state_mut(&mut self) -> &mut MatcherState { &mut self.state }
///
///     fn match_value(&mut self, actual: &Value) -> Decision {
///         let Some(want) = self.expected().value().and_then(Value::as_int) else {
///             return self.reject();
///         };
///         let len = match actual {
///             Value::String(s) => s.len(),
///             Value::List(items) => items.len(),
///             _ if self.strict => return Err(MatcherError::failed("no length").into()),
///             _ => return self.reject(),
///         };
///         Ok(i64::try_from(len).is_ok_and(|len| len == want))
///     }
/// }
///
/// impl Construct for HaveLength {
///     type Options = LengthOptions;
///
///     fn construct(
///         state: MatcherState,
///         options: LengthOptions,
///         _args: Args,
///     ) -> Result<Self, MatcherError> {
///         Ok(Self { state, strict: options.strict })
///     }
/// }
///
/// let mut m = HaveLength::create(Invocation::expecting(3))?;
/// assert!(m.matches("abc".into())?);
///
/// let options = LengthOptions { strict: true };
/// let mut strict = HaveLength::create_with(Invocation::expecting(3), options)?;
/// assert!(strict.matches(Value::Int(7)).is_err());
/// # Ok::<(), MatcherError>(())
/// ```
pub trait Construct: Matcher + Sized + 'static {
    /// Named options registration can bake in. Validated when registering.
    type Options: DeserializeOwned + Clone + Send + Sync + 'static;

    /// The implementer's own initializer.
    ///
    /// `state` already holds `expected`; `options` are the registered ones (or
    /// those given to [`create_with`](Self::create_with)); `args` holds
    /// everything after `expected`.
    ///
    /// # Errors
    ///
    /// Return [`MatcherError::InvalidArguments`] when `args` do not fit, or
    /// [`MatcherError::InvalidOptions`] for semantically invalid options.
    fn construct(
        state: MatcherState,
        options: Self::Options,
        args: Args,
    ) -> Result<Self, MatcherError>;

    /// Construct directly with default options.
    ///
    /// # Errors
    ///
    /// Propagates the error from [`construct`](Self::construct).
    fn create(invocation: Invocation) -> Result<Self, MatcherError>
    where
        Self::Options: Default,
    {
        Self::create_with(invocation, Self::Options::default())
    }

    /// Construct directly with explicit options.
    ///
    /// # Errors
    ///
    /// Propagates the error from [`construct`](Self::construct).
    fn create_with(invocation: Invocation, options: Self::Options) -> Result<Self, MatcherError> {
        let (expected, args) = invocation.into_parts();
        Self::construct(MatcherState::new(expected), options, args)
    }

    /// Register this type under `name` with no options.
    ///
    /// # Errors
    ///
    /// See [`register_as_with`](Self::register_as_with).
    fn register_as(namespace: &mut dyn Namespace, name: &str) -> Result<(), MatcherError> {
        Self::register_as_with(
            namespace,
            name,
            serde_json::Value::Object(serde_json::Map::new()),
        )
    }

    /// Register this type under `name`, baking `options` into every instance
    /// the factory builds.
    ///
    /// # Errors
    ///
    /// - [`MatcherError::InvalidOptions`] if `options` do not deserialize into
    ///   [`Self::Options`](Construct::Options)
    /// - whatever the namespace returns from [`Namespace::install`]
    fn register_as_with(
        namespace: &mut dyn Namespace,
        name: &str,
        options: serde_json::Value,
    ) -> Result<(), MatcherError> {
        let factory = crate::registry::factory_for::<Self>(name, options)?;
        namespace.install(factory)
    }
}
