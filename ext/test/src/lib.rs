//! arbiter-test: Reference matchers for conformance testing
//!
//! A small set of matchers written against the arbiter protocol, one per
//! lifecycle feature, plus a [`register`] function that installs them under
//! their conventional names. This is the reference extension that shows how
//! to build matcher libraries on arbiter.
//!
//! | Name | Type | Shows |
//! |------|------|-------|
//! | `be_nil` | [`BeNil`] | one-argument hook, optional expected |
//! | `always_pass` / `always_fail` | [`Always`] | zero-argument hook, `resolve`/`reject`, options |
//! | `be_empty` / `be_blank` | [`BeEmpty`] | one type, two names, different flags |
//! | `equal` | [`Equal`] | required expected, `diffable` |
//! | `produce` | [`Produce`] | block expectations |
//! | `satisfy` | [`Satisfy`] | trailing block forwarded to the initializer |
//!
//! # Example
//!
//! ```
//! use arbiter_test::prelude::*;
//!
//! let registry = arbiter_test::register(RegistryBuilder::new())?.build();
//!
//! let mut be_blank = registry.call("be_blank", Invocation::new())?;
//! assert!(be_blank.matches("   ".into())?);
//! # Ok::<(), MatcherError>(())
//! ```

use arbiter::prelude::*;
use serde::Deserialize;


/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{Always, BeEmpty, BeNil, Equal, Produce, Satisfy};
    pub use arbiter::prelude::*;
}

// ═══════════════════════════════════════════════════════════════════════════════
// be_nil
// ═══════════════════════════════════════════════════════════════════════════════

/// Matches [`Value::Nil`]. Ignores `expected`.
#[derive(Debug)]
pub struct BeNil {
    state: MatcherState,
}

impl Matcher for BeNil {
    fn state(&self) -> &MatcherState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut MatcherState {
        &mut self.state
    }

    fn match_value(&mut self, actual: &Value) -> Decision {
        Ok(actual.is_nil())
    }

    fn description(&self) -> Result<String, MatcherError> {
        Ok("be nil".to_owned())
    }

    fn failure_message(&self) -> Result<String, MatcherError> {
        Ok(format!("expected {:?} to be nil", self.actual()))
    }

    fn failure_message_when_negated(&self) -> Result<String, MatcherError> {
        Ok("expected a value other than nil".to_owned())
    }
}

impl Construct for BeNil {
    type Options = NoOptions;

    fn construct(
        state: MatcherState,
        _options: NoOptions,
        _args: Args,
    ) -> Result<Self, MatcherError> {
        Ok(Self { state })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// always_pass / always_fail
// ═══════════════════════════════════════════════════════════════════════════════

/// Options for [`Always`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlwaysOptions {
    #[serde(default)]
    pub result: bool,
}

/// Returns a fixed verdict through `resolve`/`reject`.
#[derive(Debug)]
pub struct Always {
    state: MatcherState,
    result: bool,
}

impl Always {
    #[must_use]
    pub fn result(&self) -> bool {
        self.result
    }
}

impl Matcher for Always {
    fn state(&self) -> &MatcherState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut MatcherState {
        &mut self.state
    }

    fn match_actual(&mut self) -> Decision {
        if self.result {
            self.resolve()?;
        }
        self.reject()
    }

    fn description(&self) -> Result<String, MatcherError> {
        let description = if self.result {
            "always pass"
        } else {
            "always fail"
        };
        Ok(description.to_owned())
    }

    fn failure_message(&self) -> Result<String, MatcherError> {
        Ok("configured to fail".to_owned())
    }

    fn failure_message_when_negated(&self) -> Result<String, MatcherError> {
        Ok("configured to pass".to_owned())
    }
}

impl Construct for Always {
    type Options = AlwaysOptions;

    fn construct(
        state: MatcherState,
        options: AlwaysOptions,
        _args: Args,
    ) -> Result<Self, MatcherError> {
        Ok(Self {
            state,
            result: options.result,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// be_empty / be_blank
// ═══════════════════════════════════════════════════════════════════════════════

/// Options for [`BeEmpty`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BeEmptyOptions {
    /// Also accept nil and whitespace-only strings.
    #[serde(default)]
    pub blank: bool,
}

/// Matches empty strings, byte strings, and lists.
///
/// With `blank`, also matches nil and whitespace-only strings. Values with no
/// notion of length fail the assertion rather than quietly not matching.
#[derive(Debug)]
pub struct BeEmpty {
    state: MatcherState,
    blank: bool,
}

impl BeEmpty {
    fn word(&self) -> &'static str {
        if self.blank {
            "blank"
        } else {
            "empty"
        }
    }
}

impl Matcher for BeEmpty {
    fn state(&self) -> &MatcherState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut MatcherState {
        &mut self.state
    }

    fn match_value(&mut self, actual: &Value) -> Decision {
        match actual {
            Value::Nil if self.blank => self.resolve(),
            Value::String(s) if self.blank => Ok(s.trim().is_empty()),
            Value::String(s) => Ok(s.is_empty()),
            Value::Bytes(b) => Ok(b.is_empty()),
            Value::List(items) => Ok(items.is_empty()),
            other => {
                let message = format!(
                    "cannot tell whether {} is {}",
                    other.type_name(),
                    self.word()
                );
                Err(MatcherError::failed(message).into())
            }
        }
    }

    fn description(&self) -> Result<String, MatcherError> {
        Ok(format!("be {}", self.word()))
    }

    fn failure_message(&self) -> Result<String, MatcherError> {
        Ok(format!(
            "expected {:?} to be {}",
            self.actual(),
            self.word()
        ))
    }

    fn failure_message_when_negated(&self) -> Result<String, MatcherError> {
        Ok(format!(
            "expected {:?} not to be {}",
            self.actual(),
            self.word()
        ))
    }
}

impl Construct for BeEmpty {
    type Options = BeEmptyOptions;

    fn construct(
        state: MatcherState,
        options: BeEmptyOptions,
        _args: Args,
    ) -> Result<Self, MatcherError> {
        Ok(Self {
            state,
            blank: options.blank,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// equal
// ═══════════════════════════════════════════════════════════════════════════════

/// Structural equality with the expected value. Diffable.
#[derive(Debug)]
pub struct Equal {
    state: MatcherState,
}

impl Matcher for Equal {
    fn state(&self) -> &MatcherState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut MatcherState {
        &mut self.state
    }

    fn match_value(&mut self, actual: &Value) -> Decision {
        Ok(self.expected().value() == Some(actual))
    }

    fn description(&self) -> Result<String, MatcherError> {
        Ok(format!("equal {:?}", self.expected_value()))
    }

    fn failure_message(&self) -> Result<String, MatcherError> {
        Ok(format!(
            "expected {:?} to equal {:?}",
            self.actual(),
            self.expected_value()
        ))
    }

    fn failure_message_when_negated(&self) -> Result<String, MatcherError> {
        Ok(format!(
            "expected {:?} not to equal {:?}",
            self.actual(),
            self.expected_value()
        ))
    }

    fn diffable(&self) -> bool {
        true
    }
}

impl Equal {
    fn expected_value(&self) -> &Value {
        self.expected().value().unwrap_or(&Value::Nil)
    }
}

impl Construct for Equal {
    type Options = NoOptions;

    fn construct(
        state: MatcherState,
        _options: NoOptions,
        _args: Args,
    ) -> Result<Self, MatcherError> {
        if state.is_undefined() {
            return Err(MatcherError::InvalidArguments {
                matcher: "equal",
                reason: "an expected value is required".to_owned(),
            });
        }
        Ok(Self { state })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// produce
// ═══════════════════════════════════════════════════════════════════════════════

/// Runs a deferred computation and matches when it succeeds, and when
/// `expected` is defined, when its result equals `expected`.
#[derive(Debug)]
pub struct Produce {
    state: MatcherState,
    produced: Option<Value>,
}

impl Produce {
    /// The value the last evaluated computation returned.
    #[must_use]
    pub fn produced(&self) -> Option<&Value> {
        self.produced.as_ref()
    }
}

impl Matcher for Produce {
    fn state(&self) -> &MatcherState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut MatcherState {
        &mut self.state
    }

    fn match_value(&mut self, actual: &Value) -> Decision {
        let Some(deferred) = actual.as_deferred() else {
            return Err(MatcherError::failed("produce expects a block").into());
        };
        let produced = deferred.evaluate()?;
        let verdict = self
            .expected()
            .value()
            .is_none_or(|expected| *expected == produced);
        self.produced = Some(produced);
        Ok(verdict)
    }

    fn description(&self) -> Result<String, MatcherError> {
        Ok(match self.expected().value() {
            Some(expected) => format!("produce {expected:?}"),
            None => "produce a value".to_owned(),
        })
    }

    fn failure_message(&self) -> Result<String, MatcherError> {
        Ok(format!(
            "expected block to {}, but it produced {:?}",
            self.description()?,
            self.produced.as_ref().unwrap_or(&Value::Nil)
        ))
    }

    fn failure_message_when_negated(&self) -> Result<String, MatcherError> {
        Ok(format!("expected block not to {}", self.description()?))
    }

    fn supports_block_expectations(&self) -> bool {
        true
    }

    fn clean_up(&mut self) -> Result<(), MatcherError> {
        tracing::trace!(produced = ?self.produced, "produce finished");
        Ok(())
    }
}

impl Construct for Produce {
    type Options = NoOptions;

    fn construct(
        state: MatcherState,
        _options: NoOptions,
        _args: Args,
    ) -> Result<Self, MatcherError> {
        Ok(Self {
            state,
            produced: None,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// satisfy
// ═══════════════════════════════════════════════════════════════════════════════

/// Matches when the trailing block returns `true` for the actual value.
///
/// The block receives `[actual, expected?, rest...]`. The first positional
/// argument after `expected`, when a string, is used as the description.
#[derive(Debug)]
pub struct Satisfy {
    state: MatcherState,
    block: Block,
    label: Option<String>,
    rest: Vec<Value>,
}

impl Matcher for Satisfy {
    fn state(&self) -> &MatcherState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut MatcherState {
        &mut self.state
    }

    fn match_value(&mut self, actual: &Value) -> Decision {
        let mut args = Vec::with_capacity(2 + self.rest.len());
        args.push(actual.clone());
        if let Some(expected) = self.expected().value() {
            args.push(expected.clone());
        }
        args.extend(self.rest.iter().cloned());

        match self.block.call(&args)? {
            Value::Bool(verdict) => Ok(verdict),
            other => {
                let message = format!("satisfy block returned {}, not bool", other.type_name());
                Err(MatcherError::failed(message).into())
            }
        }
    }

    fn description(&self) -> Result<String, MatcherError> {
        Ok(format!(
            "satisfy {}",
            self.label.as_deref().unwrap_or("the given block")
        ))
    }

    fn failure_message(&self) -> Result<String, MatcherError> {
        Ok(format!(
            "expected {:?} to {}",
            self.actual(),
            self.description()?
        ))
    }

    fn failure_message_when_negated(&self) -> Result<String, MatcherError> {
        Ok(format!(
            "expected {:?} not to {}",
            self.actual(),
            self.description()?
        ))
    }
}

impl Construct for Satisfy {
    type Options = NoOptions;

    fn construct(
        state: MatcherState,
        _options: NoOptions,
        args: Args,
    ) -> Result<Self, MatcherError> {
        let (mut rest, block) = args.into_parts();
        let block = block.ok_or_else(|| MatcherError::InvalidArguments {
            matcher: "satisfy",
            reason: "a block is required".to_owned(),
        })?;
        let label = match rest.first() {
            Some(Value::String(s)) => {
                let label = s.clone();
                rest.remove(0);
                Some(label)
            }
            _ => None,
        };
        Ok(Self {
            state,
            block,
            label,
            rest,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registration
// ═══════════════════════════════════════════════════════════════════════════════

/// Register every reference matcher with the given builder.
///
/// - `be_nil` → [`BeNil`]
/// - `always_pass` / `always_fail` → [`Always`] with `result: true` / `false`
/// - `be_empty` / `be_blank` → [`BeEmpty`] with `blank: false` / `true`
/// - `equal` → [`Equal`]
/// - `produce` → [`Produce`]
/// - `satisfy` → [`Satisfy`]
///
/// # Errors
///
/// Returns [`MatcherError::DuplicateName`] if `builder` already holds one of
/// these names.
pub fn register(builder: RegistryBuilder) -> Result<RegistryBuilder, MatcherError> {
    use serde_json::json;

    builder
        .register_as::<BeNil>("be_nil")?
        .register_as_with::<Always>("always_pass", json!({ "result": true }))?
        .register_as_with::<Always>("always_fail", json!({ "result": false }))?
        .register_as::<BeEmpty>("be_empty")?
        .register_as_with::<BeEmpty>("be_blank", json!({ "blank": true }))?
        .register_as::<Equal>("equal")?
        .register_as::<Produce>("produce")?
        .register_as::<Satisfy>("satisfy")
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter::{assess, Deferred, Expectation};

    fn registry() -> Registry {
        register(RegistryBuilder::new()).unwrap().build()
    }

    #[test]
    fn registers_every_name() {
        assert_eq!(
            registry().names(),
            vec![
                "always_fail",
                "always_pass",
                "be_blank",
                "be_empty",
                "be_nil",
                "equal",
                "produce",
                "satisfy",
            ]
        );
    }

    #[test]
    fn register_twice_collides() {
        let builder = register(RegistryBuilder::new()).unwrap();
        let err = register(builder).unwrap_err();
        assert_eq!(
            err,
            MatcherError::DuplicateName {
                name: "be_nil".into()
            }
        );
    }

    #[test]
    fn be_nil_ignores_expected() {
        let registry = registry();
        let mut m = registry.call("be_nil", Invocation::expecting(5)).unwrap();
        assert_eq!(m.expected().value(), Some(&Value::Int(5)));
        assert_eq!(m.matches(Value::Nil), Ok(true));
        assert_eq!(m.matches(Value::Int(5)), Ok(false));
        assert_eq!(m.description().unwrap(), "be nil");
    }

    #[test]
    fn always_variants_share_a_type() {
        let registry = registry();
        let mut pass = registry.call("always_pass", Invocation::new()).unwrap();
        let mut fail = registry.call("always_fail", Invocation::new()).unwrap();
        assert_eq!(pass.matches(Value::from("anything")), Ok(true));
        assert_eq!(fail.matches(Value::from("anything")), Ok(false));
        assert_eq!(
            registry.get("always_pass").unwrap().matcher_type(),
            registry.get("always_fail").unwrap().matcher_type()
        );
    }

    #[test]
    fn always_direct_construction_uses_default_options() {
        let m = Always::create(Invocation::new()).unwrap();
        assert!(!m.result());
        assert!(m.is_undefined());

        let options = AlwaysOptions { result: true };
        let mut m = Always::create_with(Invocation::new(), options).unwrap();
        assert!(m.result());
        assert_eq!(m.matches(Value::Nil), Ok(true));
    }

    #[test]
    fn blank_flag_reaches_the_initializer() {
        let options = BeEmptyOptions { blank: true };
        let mut m = BeEmpty::create_with(Invocation::new(), options).unwrap();
        assert_eq!(m.description().unwrap(), "be blank");
        assert_eq!(m.matches(" ".into()), Ok(true));
    }

    #[test]
    fn empty_and_blank_differ_on_whitespace_and_nil() {
        let registry = registry();
        let mut empty = registry.call("be_empty", Invocation::new()).unwrap();
        let mut blank = registry.call("be_blank", Invocation::new()).unwrap();

        assert_eq!(empty.matches("".into()), Ok(true));
        assert_eq!(empty.matches("  ".into()), Ok(false));
        assert_eq!(blank.matches("  ".into()), Ok(true));
        assert_eq!(blank.matches(Value::Nil), Ok(true));
        assert_eq!(empty.matches(Value::List(vec![])), Ok(true));
        assert_eq!(empty.matches(Value::List(vec![Value::Nil])), Ok(false));
        assert_eq!(
            empty.matches(Value::Nil),
            Err(MatcherError::failed("cannot tell whether nil is empty"))
        );
        assert_eq!(blank.description().unwrap(), "be blank");
    }

    #[test]
    fn equal_requires_expected() {
        let registry = registry();
        let err = registry.call("equal", Invocation::new()).unwrap_err();
        assert!(matches!(
            err,
            MatcherError::InvalidArguments {
                matcher: "equal",
                ..
            }
        ));

        let mut m = registry
            .call("equal", Invocation::expecting(Value::Nil))
            .unwrap();
        assert!(m.diffable());
        assert_eq!(m.matches(Value::Nil), Ok(true));
    }

    #[test]
    fn equal_failure_requests_diff() {
        let mut m = Equal::create(Invocation::expecting("a")).unwrap();
        let outcome = assess(&mut m, "b".into(), Expectation::Positive).unwrap();
        assert!(!outcome.passed);
        assert_eq!(
            outcome.message.as_deref(),
            Some(r#"expected String("b") to equal String("a")"#)
        );
        let diff = outcome.diff.expect("diffable matcher");
        assert_eq!(diff.expected, Value::from("a"));
        assert_eq!(diff.actual, Value::from("b"));
    }

    #[test]
    fn produce_runs_the_block() {
        let mut m = Produce::create(Invocation::expecting(42)).unwrap();
        let block = Value::Deferred(Deferred::new(|| Ok(Value::Int(42))));
        assert_eq!(m.matches(block), Ok(true));
        assert_eq!(m.produced(), Some(&Value::Int(42)));

        let mut any = Produce::create(Invocation::new()).unwrap();
        let block = Value::Deferred(Deferred::new(|| Ok(Value::from("x"))));
        assert_eq!(any.matches(block), Ok(true));
    }

    #[test]
    fn produce_passes_block_failure_through() {
        let mut m = Produce::create(Invocation::new()).unwrap();
        let block = Value::Deferred(Deferred::new(|| Err(MatcherError::failed("exploded"))));
        assert_eq!(m.matches(block), Err(MatcherError::failed("exploded")));
    }

    #[test]
    fn produce_rejects_plain_values() {
        let mut m = Produce::create(Invocation::new()).unwrap();
        assert_eq!(
            m.matches(Value::Int(1)),
            Err(MatcherError::failed("produce expects a block"))
        );
    }

    #[test]
    fn block_expectations_gate_in_assess() {
        let block = Value::Deferred(Deferred::new(|| Ok(Value::Nil)));

        let mut nil = BeNil::create(Invocation::new()).unwrap();
        assert!(matches!(
            assess(&mut nil, block.clone(), Expectation::Positive),
            Err(MatcherError::BlockExpectationUnsupported { .. })
        ));

        let mut produce = Produce::create(Invocation::expecting(1)).unwrap();
        let outcome = assess(&mut produce, block, Expectation::Positive).unwrap();
        assert!(!outcome.passed);
        assert_eq!(
            outcome.message.as_deref(),
            Some("expected block to produce Int(1), but it produced Nil")
        );
    }

    #[test]
    fn satisfy_forwards_block_and_rest() {
        let registry = registry();
        let invocation = Invocation::expecting(10)
            .arg("be below the limit")
            .arg(2)
            .block(|args| {
                let actual = args[0].as_int().unwrap_or(i64::MAX);
                let limit = args[1].as_int().unwrap_or(0);
                let factor = args[2].as_int().unwrap_or(1);
                Ok(Value::Bool(actual * factor < limit))
            });
        let mut m = registry.call("satisfy", invocation).unwrap();

        assert_eq!(m.matches(Value::Int(4)), Ok(true));
        assert_eq!(m.matches(Value::Int(5)), Ok(false));
        assert_eq!(m.description().unwrap(), "satisfy be below the limit");
    }

    #[test]
    fn satisfy_requires_block() {
        let err = registry().call("satisfy", Invocation::new()).unwrap_err();
        assert!(matches!(
            err,
            MatcherError::InvalidArguments {
                matcher: "satisfy",
                ..
            }
        ));
    }

    #[test]
    fn satisfy_rejects_non_bool_block_result() {
        let invocation = Invocation::new().block(|_| Ok(Value::Int(1)));
        let mut m = Satisfy::create(invocation).unwrap();
        assert_eq!(
            m.matches(Value::Nil),
            Err(MatcherError::failed("satisfy block returned int, not bool"))
        );
    }
}
