use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::ops::RangeInclusive;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tracing::debug;

use crate::context::MatcherContext;
use crate::errors::{Error, Result};
use crate::value::Expected;

pub mod builtins;

/// Outcome of a matcher: did the underlying predicate hold, and the text to
/// report if that turns out to be a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub pass: bool,
    pub message: String,
}

impl Verdict {
    pub fn new(pass: bool, message: impl Into<String>) -> Self {
        Self { pass, message: message.into() }
    }
}

/// Synchronous matchers answer right away, asynchronous ones hand back a
/// future the dispatcher awaits.
pub enum MatcherReturn {
    Ready(Result<Verdict>),
    Deferred(BoxFuture<'static, Result<Verdict>>),
}

impl MatcherReturn {
    pub fn deferred<Fut>(fut: Fut) -> Self
    where
        Fut: Future<Output = Result<Verdict>> + Send + 'static,
    {
        Self::Deferred(fut.boxed())
    }
}

impl From<Verdict> for MatcherReturn {
    fn from(v: Verdict) -> Self {
        Self::Ready(Ok(v))
    }
}

impl From<Result<Verdict>> for MatcherReturn {
    fn from(r: Result<Verdict>) -> Self {
        Self::Ready(r)
    }
}

impl fmt::Debug for MatcherReturn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(r) => f.debug_tuple("Ready").field(r).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// A named comparison the dispatcher can look up.
pub trait Matcher: Send + Sync {
    fn name(&self) -> &'static str;
    fn arity(&self) -> RangeInclusive<usize>;
    fn check(&self, ctx: &MatcherContext, args: &[Expected]) -> MatcherReturn;

    /// Judge the producer itself (did it succeed, what did it fail with)
    /// rather than a value it produced. The dispatcher then hands the source
    /// over in [`MatcherContext::producer`] without invoking it.
    fn takes_producer(&self) -> bool {
        false
    }
}

/// Closure-backed matcher, see [`matcher_fn`].
pub struct FnMatcher<F> {
    name: &'static str,
    arity: RangeInclusive<usize>,
    f: F,
}

/// Wrap a closure as a [`Matcher`].
///
/// ```
/// use phrase_assert::matchers::{matcher_fn, Verdict};
///
/// let even = matcher_fn("to_be_even", 0..=0, |ctx, _| {
///     let pass = ctx.received.as_i64().is_some_and(|n| n % 2 == 0);
///     Verdict::new(pass, format!("expected {} to be even", ctx.received)).into()
/// });
/// ```
pub fn matcher_fn<F>(name: &'static str, arity: RangeInclusive<usize>, f: F) -> FnMatcher<F>
where
    F: Fn(&MatcherContext, &[Expected]) -> MatcherReturn + Send + Sync,
{
    FnMatcher { name, arity, f }
}

impl<F> Matcher for FnMatcher<F>
where
    F: Fn(&MatcherContext, &[Expected]) -> MatcherReturn + Send + Sync,
{
    fn name(&self) -> &'static str { self.name }
    fn arity(&self) -> RangeInclusive<usize> { self.arity.clone() }
    fn check(&self, ctx: &MatcherContext, args: &[Expected]) -> MatcherReturn {
        (self.f)(ctx, args)
    }
}

/// Matcher registry. Clones share storage until one of them registers
/// something, so extending a clone never leaks into the registry it came from.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<HashMap<&'static str, Arc<dyn Matcher>>>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_all(builtins::all());
        registry
    }

    /// Same-name registrations overwrite earlier ones.
    pub fn register<M: Matcher + 'static>(&mut self, m: M) {
        self.register_arc(Arc::new(m));
    }

    pub fn register_arc(&mut self, m: Arc<dyn Matcher>) {
        let map = Arc::make_mut(&mut self.inner);
        if map.insert(m.name(), m.clone()).is_some() {
            debug!(matcher = m.name(), "matcher overwritten");
        }
    }

    pub fn register_all<I>(&mut self, matchers: I)
    where
        I: IntoIterator<Item = Arc<dyn Matcher>>,
    {
        for m in matchers {
            self.register_arc(m);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Matcher>> {
        self.inner.get(name).cloned()
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Matcher>> {
        self.get(name).ok_or_else(|| Error::MatcherNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.inner.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("matchers", &self.names()).finish()
    }
}
