//! Name -> factory registry for matcher types.
//!
//! Registration turns a concrete [`Construct`] type into a [`Factory`]: the type
//! `T` is monomorphized into a closure and erased behind `Box<dyn Fn>` at
//! registration time, the same early-erasure pattern axum uses for handlers.
//! Callers then build matchers by name without naming `T`.
//!
//! One type may be registered several times under different names, each with
//! its own baked-in options:
//!
//! ```
//! use arbiter::prelude::*;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Clone, Deserialize)]
//! #[serde(deny_unknown_fields)]
//! struct AlwaysOptions {
//!     result: bool,
//! }
//!
//! #[derive(Debug)]
//! struct Always {
//!     state: MatcherState,
//!     result: bool,
//! }
//!
//! impl Matcher for Always {
//!     fn state(&self) -> &MatcherState { &self.state }
//!     fn state_mut(&mut self) -> &mut MatcherState { &mut self.state }
//!
//!     fn match_actual(&mut self) -> Decision {
//!         if self.result { self.resolve() } else { self.reject() }
//!     }
//! }
//!
//! impl Construct for Always {
//!     type Options = AlwaysOptions;
//!
//!     fn construct(
//!         state: MatcherState,
//!         options: AlwaysOptions,
//!         _args: Args,
//!     ) -> Result<Self, MatcherError> {
//!         Ok(Self { state, result: options.result })
//!     }
//! }
//!
//! let registry = RegistryBuilder::new()
//!     .register_as_with::<Always>("always_pass", serde_json::json!({ "result": true }))?
//!     .register_as_with::<Always>("always_fail", serde_json::json!({ "result": false }))?
//!     .build();
//!
//! assert!(registry.call("always_pass", Invocation::new())?.matches(Value::Nil)?);
//! assert!(!registry.call("always_fail", Invocation::new())?.matches(Value::Nil)?);
//! # Ok::<(), MatcherError>(())
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::{Construct, Invocation, Matcher, MatcherError};

/// What a factory call produces.
type Built = Result<Box<dyn Matcher>, MatcherError>;

/// Type-erased matcher constructor.
type BoxedFactory = Box<dyn Fn(Invocation) -> Built + Send + Sync>;

/// A named constructor for one matcher type with fixed options.
pub struct Factory {
    name: String,
    matcher_type: &'static str,
    build: BoxedFactory,
}

impl Factory {
    /// The name this factory is installed under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name of the matcher it builds.
    #[must_use]
    pub fn matcher_type(&self) -> &'static str {
        self.matcher_type
    }

    /// Build a matcher.
    ///
    /// # Errors
    ///
    /// Propagates errors from the matcher's initializer and option setter.
    pub fn call(&self, invocation: Invocation) -> Result<Box<dyn Matcher>, MatcherError> {
        (self.build)(invocation)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("name", &self.name)
            .field("matcher_type", &self.matcher_type)
            .finish_non_exhaustive()
    }
}

/// Build the factory for `T`, validating `options` against `T::Options` now.
pub(crate) fn factory_for<T: Construct>(
    name: &str,
    options: serde_json::Value,
) -> Result<Factory, MatcherError> {
    let matcher_type = std::any::type_name::<T>();
    let options: T::Options =
        serde_json::from_value(options).map_err(|e| MatcherError::InvalidOptions {
            matcher: matcher_type,
            reason: e.to_string(),
        })?;

    tracing::debug!(name, matcher_type, "built matcher factory");

    Ok(Factory {
        name: name.to_owned(),
        matcher_type,
        build: Box::new(move |invocation: Invocation| {
            let matcher = T::create_with(invocation, options.clone())?;
            Ok(Box::new(matcher) as Box<dyn Matcher>)
        }),
    })
}

/// The namespace registration writes into.
///
/// Owned by the assertion framework. [`RegistryBuilder`] is the provided
/// implementation.
pub trait Namespace {
    /// Install one factory under [`Factory::name`].
    ///
    /// # Errors
    ///
    /// Implementation-defined; [`RegistryBuilder`] rejects duplicate names.
    fn install(&mut self, factory: Factory) -> Result<(), MatcherError>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Builder for constructing a [`Registry`].
///
/// The registry is immutable after [`build()`](Self::build): there is no
/// unregister and no late registration.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    factories: HashMap<String, Factory>,
}

impl RegistryBuilder {
    /// Create a new empty registry builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `name` with no options.
    ///
    /// # Errors
    ///
    /// - [`MatcherError::InvalidOptions`] if `T::Options` requires fields
    /// - [`MatcherError::DuplicateName`] if `name` is taken
    pub fn register_as<T: Construct>(mut self, name: &str) -> Result<Self, MatcherError> {
        T::register_as(&mut self, name)?;
        Ok(self)
    }

    /// Register `T` under `name`, baking in `options`.
    ///
    /// # Errors
    ///
    /// - [`MatcherError::InvalidOptions`] if `options` do not fit `T::Options`
    /// - [`MatcherError::DuplicateName`] if `name` is taken
    pub fn register_as_with<T: Construct>(
        mut self,
        name: &str,
        options: serde_json::Value,
    ) -> Result<Self, MatcherError> {
        T::register_as_with(&mut self, name, options)?;
        Ok(self)
    }

    /// Freeze the registry.
    #[must_use]
    pub fn build(self) -> Registry {
        Registry {
            factories: self.factories,
        }
    }
}

impl Namespace for RegistryBuilder {
    fn install(&mut self, factory: Factory) -> Result<(), MatcherError> {
        if self.factories.contains_key(factory.name()) {
            return Err(MatcherError::DuplicateName { name: factory.name });
        }
        tracing::debug!(
            name = factory.name(),
            matcher_type = factory.matcher_type(),
            "registered matcher"
        );
        self.factories.insert(factory.name.clone(), factory);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable name -> factory map.
///
/// Constructed via [`RegistryBuilder`]. Use [`call()`](Self::call) to build a
/// matcher by name.
#[derive(Debug)]
pub struct Registry {
    factories: HashMap<String, Factory>,
}

impl Registry {
    /// Build the matcher registered under `name`.
    ///
    /// # Errors
    ///
    /// - [`MatcherError::UnknownMatcher`] if `name` is not registered
    /// - errors from the matcher's initializer or option setter
    pub fn call(
        &self,
        name: &str,
        invocation: Invocation,
    ) -> Result<Box<dyn Matcher>, MatcherError> {
        self.get(name)
            .ok_or_else(|| MatcherError::UnknownMatcher {
                name: name.to_owned(),
                available: self.names().into_iter().map(str::to_owned).collect(),
            })?
            .call(invocation)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Factory> {
        self.factories.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Returns all registered names (sorted).
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
