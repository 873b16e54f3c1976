//! Resolution control - early exit from a decision with guaranteed cleanup
//!
//! A decision routine returns [`Decision`]. Besides a plain `Ok(verdict)` it can
//! short-circuit by returning an [`Escape`]:
//!
//! - [`Region::resolve`] / [`Region::reject`] produce an early verdict tagged
//!   with the region they target. Because they are `Err` values, `?` carries
//!   them out of any helper that returns `Result<_, Escape>`.
//! - Any [`MatcherError`] converts into [`Escape::Failure`] through `?`.
//!
//! [`Region::run`] executes the routine and runs the cleanup step exactly once
//! on every exit path: normal return, early verdict, failure, or panic.
//!
//! ```
//! use arbiter::resolution::{Decision, Region};
//!
//! fn check(region: &Region, n: i64) -> Result<(), arbiter::resolution::Escape> {
//!     if n < 0 {
//!         region.reject()?;
//!     }
//!     Ok(())
//! }
//!
//! let mut cleanups = 0;
//! let region = Region::new();
//! let verdict = region.run(
//!     &mut cleanups,
//!     |_, region| -> Decision {
//!         check(region, -1)?;
//!         Ok(true)
//!     },
//!     |cleanups| {
//!         *cleanups += 1;
//!         Ok(())
//!     },
//! );
//! assert_eq!(verdict.ok(), Some(false));
//! assert_eq!(cleanups, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use crate::MatcherError;

/// Result of a decision routine.
pub type Decision = Result<bool, Escape>;

/// Process-unique identity of a [`Region`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(u64);

static NEXT_REGION: AtomicU64 = AtomicU64::new(1);

impl RegionId {
    fn next() -> Self {
        Self(NEXT_REGION.fetch_add(1, Ordering::Relaxed))
    }
}

/// An early verdict addressed to one region.
///
/// Only a [`Region`] (or a matcher inside one) can create it, so a verdict can
/// never be forged for a region that did not issue it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    region: RegionId,
    verdict: bool,
}

impl Resolution {
    pub(crate) fn new(region: RegionId, verdict: bool) -> Self {
        Self { region, verdict }
    }

    #[must_use]
    pub fn region(&self) -> RegionId {
        self.region
    }

    #[must_use]
    pub fn verdict(&self) -> bool {
        self.verdict
    }
}

/// Non-local exit from a decision routine.
#[derive(Debug, Clone, PartialEq)]
pub enum Escape {
    /// Early verdict for a specific region.
    Resolution(Resolution),
    /// Failure to pass through unchanged.
    Failure(MatcherError),
}

impl From<MatcherError> for Escape {
    fn from(err: MatcherError) -> Self {
        Self::Failure(err)
    }
}

/// A controlled region with its own escape channel.
#[derive(Debug)]
pub struct Region {
    id: RegionId,
}

impl Default for Region {
    fn default() -> Self {
        Self::new()
    }
}

impl Region {
    /// Open a region with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: RegionId::next(),
        }
    }

    #[must_use]
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Escape this region with verdict `true`.
    ///
    /// # Errors
    ///
    /// Always returns `Err`; that is what aborts the caller.
    pub fn resolve(&self) -> Decision {
        self.exit(true)
    }

    /// Escape this region with verdict `false`.
    ///
    /// # Errors
    ///
    /// Always returns `Err`; that is what aborts the caller.
    pub fn reject(&self) -> Decision {
        self.exit(false)
    }

    /// Escape this region with `verdict`.
    ///
    /// # Errors
    ///
    /// Always returns `Err`; that is what aborts the caller.
    pub fn exit(&self, verdict: bool) -> Decision {
        Err(Escape::Resolution(Resolution::new(self.id, verdict)))
    }

    /// Run `body` against `ctx`, then `cleanup` exactly once.
    ///
    /// | `body` outcome | Result |
    /// |---|---|
    /// | `Ok(v)` | `Ok(v)`, or the cleanup error |
    /// | resolution for this region | its verdict, or the cleanup error |
    /// | resolution for another region | passed through unchanged |
    /// | `Failure(e)` | `Failure(e)`; a cleanup error is logged and dropped |
    /// | panic | cleanup runs during unwinding, panic continues; a cleanup error is logged |
    ///
    /// # Errors
    ///
    /// See the table above.
    pub fn run<C, B, F>(self, ctx: &mut C, body: B, cleanup: F) -> Decision
    where
        C: ?Sized,
        B: FnOnce(&mut C, &Region) -> Decision,
        F: FnOnce(&mut C) -> Result<(), MatcherError>,
    {
        let guard = Ensure {
            ctx,
            region: self.id,
            cleanup: Some(cleanup),
        };
        let outcome = body(&mut *guard.ctx, &self);
        let cleaned = guard.finish();

        match outcome {
            Ok(verdict) => cleaned.map(|()| verdict).map_err(Escape::Failure),
            Err(Escape::Resolution(r)) if r.region == self.id => {
                cleaned.map(|()| r.verdict).map_err(Escape::Failure)
            }
            Err(escape) => {
                if let Err(err) = cleaned {
                    tracing::warn!(
                        region = self.id.0,
                        error = %err,
                        "cleanup failed while an escape was propagating; keeping the original"
                    );
                }
                Err(escape)
            }
        }
    }
}

/// Runs the cleanup on drop unless [`finish`](Self::finish) already did.
struct Ensure<'a, C, F>
where
    C: ?Sized,
    F: FnOnce(&mut C) -> Result<(), MatcherError>,
{
    ctx: &'a mut C,
    region: RegionId,
    cleanup: Option<F>,
}

impl<C, F> Ensure<'_, C, F>
where
    C: ?Sized,
    F: FnOnce(&mut C) -> Result<(), MatcherError>,
{
    fn finish(mut self) -> Result<(), MatcherError> {
        match self.cleanup.take() {
            Some(cleanup) => cleanup(&mut *self.ctx),
            None => Ok(()),
        }
    }
}

impl<C, F> Drop for Ensure<'_, C, F>
where
    C: ?Sized,
    F: FnOnce(&mut C) -> Result<(), MatcherError>,
{
    fn drop(&mut self) {
        // Only reached with a pending cleanup while unwinding out of `body`.
        if let Some(cleanup) = self.cleanup.take() {
            if let Err(err) = cleanup(&mut *self.ctx) {
                tracing::warn!(
                    region = self.region.0,
                    error = %err,
                    "cleanup failed while unwinding; keeping the panic"
                );
            }
        }
    }
}
