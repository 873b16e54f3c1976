//! arbiter - lifecycle protocol and registry for custom assertion matchers
//!
//! A matcher decides whether an observed value satisfies a condition and can
//! explain its verdict. This crate defines how a matcher receives its inputs,
//! how it reports a verdict, how its cleanup is guaranteed, and how matcher
//! types are registered under a name.
//!
//! # Architecture
//!
//! - [`Value`] - Erased datum passed as `actual` and held as `expected`
//! - [`MatcherState`] - `expected` / `actual` storage every matcher embeds
//! - [`resolution`] - Early-exit verdicts with guaranteed cleanup
//! - [`Matcher`] - The hook contract a concrete matcher implements
//! - [`MatcherExt::matches`] - The single entry point that drives the hooks
//! - [`Construct`] - Two-phase construction: expected + options, then the
//!   implementer's own initializer
//! - [`RegistryBuilder`] / [`Registry`] - Name -> factory bindings
//! - [`assess`] - The call sequence an assertion framework runs on a matcher
//!
//! # Key Design Insights
//!
//! 1. **Decisions are `Result`s**: `resolve()`/`reject()` return an `Err`
//!    escape, so `?` unwinds out of nested helpers back to the entry point.
//!
//! 2. **Cleanup is a drop guard**: `clean_up` runs exactly once whether the
//!    decision returned, escaped, failed, or panicked.
//!
//! 3. **Options are validated at registration**: a misspelled option key fails
//!    when the registry is built, not when a test first runs.
//!
//! # Example
//!
//! ```
//! use arbiter::prelude::*;
//!
//! #[derive(Debug)]
//! struct BeNil {
//!     state: MatcherState,
//! }
//!
//! impl Matcher for BeNil {
//!     fn state(&self) -> &MatcherState {
//!         &self.state
//!     }
//!
//!     fn state_mut(&mut self) -> &mut MatcherState {
//!         &mut self.state
//!     }
//!
//!     fn match_value(&mut self, actual: &Value) -> Decision {
//!         Ok(actual.is_nil())
//!     }
//! }
//!
//! impl Construct for BeNil {
//!     type Options = NoOptions;
//!
//!     fn construct(
//!         state: MatcherState,
//!         _options: NoOptions,
//!         _args: Args,
//!     ) -> Result<Self, MatcherError> {
//!         Ok(Self { state })
//!     }
//! }
//!
//! let registry = RegistryBuilder::new()
//!     .register_as::<BeNil>("be_nil")?
//!     .build();
//!
//! let mut matcher = registry.call("be_nil", Invocation::new())?;
//! assert!(matcher.matches(Value::Nil)?);
//! assert!(!matcher.matches(Value::Int(5))?);
//! # Ok::<(), MatcherError>(())
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod construct;
mod matcher;
mod outcome;
mod registry;
pub mod resolution;
mod state;
mod value;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

pub use construct::{Args, Block, Construct, Invocation, NoOptions};
pub use matcher::{Matcher, MatcherExt};
pub use outcome::{assess, DiffRequest, Expectation, Outcome};
pub use registry::{Factory, Namespace, Registry, RegistryBuilder};
pub use resolution::{Decision, Escape};
pub use state::{Expected, MatcherState, UNDEFINED};
pub use value::{CustomValue, Deferred, Value};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use arbiter::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Args, Block, Construct, Decision, Escape, Expected, Invocation, Matcher, MatcherError,
        MatcherExt, MatcherState, Namespace, NoOptions, Registry, RegistryBuilder, Value,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors raised by matchers, the entry point, and the registry.
///
/// Decision failures pass through [`matches`](MatcherExt::matches) unchanged;
/// nothing in this crate retries or translates them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatcherError {
    /// A hook the matcher did not override was called.
    #[error("{hook} is not implemented")]
    NotImplemented {
        /// Name of the hook (`"match"`, `"description"`, ...).
        hook: &'static str,
    },

    /// Matcher code failed while deciding.
    #[error("{message}")]
    Failed {
        /// Human-readable reason.
        message: String,
    },

    /// `resolve`/`reject` was called with no decision in progress.
    #[error("{operation} called outside an active decision")]
    NoActiveRegion {
        /// `"resolve"` or `"reject"`.
        operation: &'static str,
    },

    /// An early verdict addressed to another region reached an entry point.
    #[error("early verdict escaped the decision it was issued for")]
    MisdirectedResolution,

    /// Registration options did not fit the matcher's option type.
    #[error("invalid options for {matcher}: {reason}")]
    InvalidOptions {
        /// Matcher type name.
        matcher: &'static str,
        /// The underlying error message.
        reason: String,
    },

    /// The matcher's initializer rejected its arguments.
    #[error("invalid arguments for {matcher}: {reason}")]
    InvalidArguments {
        /// Matcher type name.
        matcher: &'static str,
        /// The underlying error message.
        reason: String,
    },

    /// No factory is registered under the name.
    #[error("unknown matcher \"{name}\"{}", list_available(.available))]
    UnknownMatcher {
        /// The unregistered name.
        name: String,
        /// Names that ARE registered, sorted.
        available: Vec<String>,
    },

    /// A factory is already registered under the name.
    #[error("matcher \"{name}\" is already registered")]
    DuplicateName {
        /// The contested name.
        name: String,
    },

    /// A deferred computation was given to a matcher that only takes values.
    #[error("{matcher} does not support block expectations")]
    BlockExpectationUnsupported {
        /// Debug rendering of the matcher.
        matcher: String,
    },
}

impl MatcherError {
    /// Shorthand for [`MatcherError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

fn list_available(available: &[String]) -> String {
    if available.is_empty() {
        " (no matchers are registered)".to_owned()
    } else {
        format!(" (registered: {})", available.join(", "))
    }
}
