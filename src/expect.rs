use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::config::{Config, PollOptions, PollSettings};
use crate::context::{MatcherContext, Producer, Received};
use crate::errors::{AssertionFailure, Error, FailureKind, Result};
use crate::matchers::{Matcher, MatcherReturn, Registry, Verdict};
use crate::poll::poll_with;
use crate::value::Expected;

/// Handle over one received value. Modifiers are chained before the terminal
/// matcher call; a passing call hands the handle back for further checks.
#[derive(Debug, Clone)]
pub struct Expect {
    registry: Registry,
    received: Received,
    is_not: bool,
    is_soft: bool,
    is_poll: bool,
    timeout: Duration,
    interval: Duration,
}

impl Expect {
    pub fn new(registry: Registry, received: Received, poll_defaults: PollSettings) -> Self {
        Self {
            registry,
            received,
            is_not: false,
            is_soft: false,
            is_poll: false,
            timeout: poll_defaults.timeout(),
            interval: poll_defaults.interval(),
        }
    }

    pub fn not(mut self) -> Self {
        self.is_not = true;
        self
    }

    pub fn soft(mut self) -> Self {
        self.is_soft = true;
        self
    }

    /// Switch to polling: the producer is re-invoked until the matcher
    /// passes or the timeout elapses. Only producer handles can poll.
    pub fn poll(mut self, options: PollOptions) -> Result<Self> {
        if !matches!(self.received, Received::Producer(_)) {
            return Err(Error::InvalidReceived("provided value must be a producer to poll".into()));
        }
        self.timeout = options.timeout.unwrap_or(self.timeout);
        self.interval = options.interval.unwrap_or(self.interval);
        self.is_poll = true;
        Ok(self)
    }

    pub fn received(&self) -> &Received {
        &self.received
    }

    pub fn is_not(&self) -> bool {
        self.is_not
    }

    pub fn is_soft(&self) -> bool {
        self.is_soft
    }

    pub fn is_poll(&self) -> bool {
        self.is_poll
    }

    /// `(timeout, interval)` a polling call would use.
    pub fn poll_timing(&self) -> (Duration, Duration) {
        (self.timeout, self.interval)
    }

    fn failure_kind(&self) -> FailureKind {
        if self.is_soft { FailureKind::Soft } else { FailureKind::Hard }
    }

    fn resolve(&self, name: &str, args: &[Expected]) -> Result<Arc<dyn Matcher>> {
        let matcher = self.registry.lookup(name)?;
        let arity = matcher.arity();
        if !arity.contains(&args.len()) {
            return Err(Error::Arity {
                matcher: name.to_string(),
                expected: arity,
                got: args.len(),
            });
        }
        debug!(matcher = name, is_not = self.is_not, is_soft = self.is_soft, is_poll = self.is_poll, "dispatching matcher");
        Ok(matcher)
    }

    fn context(&self, received: Value) -> MatcherContext {
        MatcherContext {
            received,
            producer: None,
            is_not: self.is_not,
            is_soft: self.is_soft,
            is_poll: self.is_poll,
        }
    }

    /// The predicate failing a positive check, or holding for a negated
    /// one, is an assertion failure.
    fn settle(&self, verdict: Verdict) -> Result<()> {
        if self.is_not == verdict.pass {
            return Err(AssertionFailure::new(self.failure_kind(), verdict.message).into());
        }
        Ok(())
    }

    /// Run a synchronous matcher against a plain value.
    pub fn call(self, name: &str, args: Vec<Expected>) -> Result<Self> {
        let matcher = self.resolve(name, &args)?;
        let Received::Value(received) = &self.received else {
            return Err(Error::InvalidReceived(format!("{name} needs call_async for a producer")));
        };
        match matcher.check(&self.context(received.clone()), &args) {
            MatcherReturn::Ready(verdict) => self.settle(verdict?)?,
            MatcherReturn::Deferred(_) => return Err(Error::AsyncMatcher(name.to_string())),
        }
        Ok(self)
    }

    /// Run any matcher, awaiting deferred verdicts. Producers are invoked
    /// once, or repeatedly when the handle is in poll mode.
    pub async fn call_async(self, name: &str, args: Vec<Expected>) -> Result<Self> {
        let resolved = self.resolve(name, &args)?;
        let (matcher, args) = (resolved.as_ref(), args.as_slice());
        match &self.received {
            Received::Producer(producer) if self.is_poll => {
                let this = &self;
                poll_with(move || this.attempt(producer, matcher, args), self.timeout, self.interval).await?;
            }
            Received::Producer(producer) => self.attempt(producer, matcher, args).await?,
            Received::Value(_) if matcher.takes_producer() => {
                return Err(Error::InvalidReceived(format!("{name} needs a producer")));
            }
            Received::Value(received) => self.evaluate(matcher, self.context(received.clone()), args).await?,
        }
        Ok(self)
    }

    /// One evaluation against a producer. A failing producer fails the
    /// attempt unless the matcher judges the producer itself.
    async fn attempt(&self, producer: &Producer, matcher: &dyn Matcher, args: &[Expected]) -> Result<()> {
        let ctx = if matcher.takes_producer() {
            self.context(Value::Null).with_producer(producer.clone())
        } else {
            self.context(producer().await?)
        };
        self.evaluate(matcher, ctx, args).await
    }

    async fn evaluate(&self, matcher: &dyn Matcher, ctx: MatcherContext, args: &[Expected]) -> Result<()> {
        let verdict = match matcher.check(&ctx, args) {
            MatcherReturn::Ready(verdict) => verdict?,
            MatcherReturn::Deferred(fut) => fut.await?,
        };
        self.settle(verdict)
    }
}

/// Factory for [`Expect`] handles over one registry.
#[derive(Debug, Clone, Default)]
pub struct Expectations {
    registry: Registry,
    config: Config,
}

impl Expectations {
    pub fn new(registry: Registry) -> Self {
        Self { registry, config: Config::default() }
    }

    pub fn with_builtins() -> Self {
        Self::new(Registry::with_builtins())
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn expect(&self, received: impl Into<Value>) -> Expect {
        Expect::new(self.registry.clone(), Received::Value(received.into()), self.config.fluent_poll)
    }

    /// Handle over an async source, for use with [`Expect::poll`] or the
    /// producer matchers (`to_pass`, `to_resolve_with`, `to_reject_with`).
    pub fn expect_producer<F, Fut>(&self, producer: F) -> Expect
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Expect::new(self.registry.clone(), Received::producer(producer), self.config.fluent_poll)
    }

    /// A new factory that also knows `matchers`; `self` is left untouched.
    pub fn extend<I>(&self, matchers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Matcher>>,
    {
        let mut registry = self.registry.clone();
        registry.register_all(matchers);
        Self { registry, config: self.config }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::matchers::matcher_fn;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    fn amount_matcher() -> Arc<dyn Matcher> {
        Arc::new(matcher_fn("to_have_amount", 1..=1, |ctx, args| {
            let expected = args[0].as_value().cloned().unwrap_or_default();
            let pass = ctx.received == expected;
            let message = if pass {
                format!("expected not to have amount {expected}")
            } else {
                format!("expected {expected}, but got {}", ctx.received)
            };
            Verdict::new(pass, message).into()
        }))
    }

    #[test]
    fn pass_returns_handle_and_failure_kind_follows_soft() {
        let e = Expectations::with_builtins();
        let handle = e.expect(json!(1)).call("to_equal", args![1]).unwrap();
        assert!(handle.call("to_be_less_than", args![2]).is_ok());

        let hard = e.expect(json!(1)).call("to_equal", args![2]).unwrap_err();
        let soft = e.expect(json!(1)).soft().call("to_equal", args![2]).unwrap_err();
        assert!(!hard.is_soft());
        assert!(soft.is_soft());
        assert_eq!(hard.to_string(), soft.to_string());
    }

    #[test]
    fn negation_flips_the_decision() {
        let e = Expectations::with_builtins();
        assert!(e.expect(json!(2)).not().call("to_equal", args![3]).is_ok());
        let err = e.expect(json!(2)).not().call("to_equal", args![2]).unwrap_err();
        assert_eq!(err.to_string(), "expected 2 to not strictly equal 2");
    }

    #[test]
    fn unknown_matcher_and_bad_arity() {
        let e = Expectations::with_builtins();
        let err = e.expect(json!(1)).call("to_fly", args![]).unwrap_err();
        assert!(matches!(err, Error::MatcherNotFound(ref n) if n == "to_fly"));
        let err = e.expect(json!(1)).call("to_equal", args![]).unwrap_err();
        assert_eq!(err.to_string(), "to_equal accepts 1 arguments, got 0");
    }

    #[test]
    fn matcher_errors_propagate_unchanged() {
        let e = Expectations::with_builtins();
        let err = e.expect(json!("two")).call("to_be_greater_than", args![1]).unwrap_err();
        assert!(matches!(err, Error::NotANumber(_)));
    }

    #[test]
    fn extend_leaves_base_untouched() {
        let base = Expectations::with_builtins();
        let extended = base.extend([amount_matcher()]);
        assert!(extended.expect(json!(100)).call("to_have_amount", args![100]).is_ok());
        let err = extended.expect(json!(50)).call("to_have_amount", args![100]).unwrap_err();
        assert_eq!(err.to_string(), "expected 100, but got 50");
        assert!(matches!(
            base.expect(json!(100)).call("to_have_amount", args![100]),
            Err(Error::MatcherNotFound(_))
        ));
    }

    #[test]
    fn poll_requires_producer() {
        let e = Expectations::with_builtins();
        assert!(matches!(e.expect(json!(1)).poll(PollOptions::new()), Err(Error::InvalidReceived(_))));
        let handle = e.expect_producer(|| async { Ok(json!(1)) });
        assert!(matches!(handle.clone().call("to_equal", args![1]), Err(Error::InvalidReceived(_))));
        let polled = handle.poll(PollOptions::new().timeout(Duration::from_millis(300))).unwrap();
        assert!(polled.is_poll());
        assert_eq!(polled.poll_timing(), (Duration::from_millis(300), Duration::from_millis(100)));
    }

    #[test]
    fn poll_timing_keeps_sub_millisecond_precision() {
        let e = Expectations::with_builtins();
        let polled = e
            .expect_producer(|| async { Ok(json!(1)) })
            .poll(PollOptions::new().interval(Duration::from_micros(500)).timeout(Duration::from_micros(2500)))
            .unwrap();
        assert_eq!(polled.poll_timing(), (Duration::from_micros(2500), Duration::from_micros(500)));
    }

    #[test]
    fn deferred_matcher_needs_async_path() {
        let e = Expectations::with_builtins().extend([Arc::new(matcher_fn("to_resolve", 0..=0, |_, _| {
            MatcherReturn::deferred(async { Ok::<_, Error>(Verdict::new(true, "resolved")) })
        })) as Arc<dyn Matcher>]);
        let err = e.expect(json!(null)).call("to_resolve", args![]).unwrap_err();
        assert!(matches!(err, Error::AsyncMatcher(_)));
    }

    #[tokio::test]
    async fn async_path_awaits_deferred_verdicts() {
        let e = Expectations::with_builtins().extend([Arc::new(matcher_fn("to_be_positive_later", 0..=0, |ctx, _| {
            let n = ctx.received.as_i64().unwrap_or_default();
            MatcherReturn::deferred(async move {
                tokio::task::yield_now().await;
                Ok::<_, Error>(Verdict::new(n > 0, format!("expected {n} to be positive")))
            })
        })) as Arc<dyn Matcher>]);
        assert!(e.expect(json!(3)).call_async("to_be_positive_later", args![]).await.is_ok());
        let err = e.expect(json!(-3)).soft().call_async("to_be_positive_later", args![]).await.unwrap_err();
        assert!(err.is_soft());
        assert_eq!(err.to_string(), "expected -3 to be positive");
    }

    #[tokio::test(start_paused = true)]
    async fn poll_mode_retries_fresh_values() {
        use std::sync::atomic::{AtomicI64, Ordering};
        let e = Expectations::with_builtins();
        let counter = Arc::new(AtomicI64::new(0));
        let source = counter.clone();
        let handle = e
            .expect_producer(move || {
                let source = source.clone();
                async move { Ok(json!(source.fetch_add(1, Ordering::SeqCst))) }
            })
            .poll(PollOptions::new().interval(Duration::from_millis(50)))
            .unwrap();
        let handle = handle.call_async("to_equal", args![4]).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert!(handle.is_poll());
    }

    #[tokio::test(start_paused = true)]
    async fn poll_mode_times_out_with_last_failure() {
        let e = Expectations::with_builtins();
        let err = e
            .expect_producer(|| async { Ok(json!("stale")) })
            .soft()
            .poll(PollOptions::new().timeout(Duration::from_millis(250)))
            .unwrap()
            .call_async("to_equal", args!["fresh"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PollTimeout { .. }));
        assert!(err.is_soft());
        assert_eq!(err.to_string(), "expected 'stale' to strictly equal 'fresh'");
    }

    #[tokio::test]
    async fn failing_producer_fails_a_single_attempt() {
        let e = Expectations::with_builtins();
        let err = e
            .expect_producer(|| async { Err::<Value, _>(Error::Producer("connection refused".into())) })
            .call_async("to_equal", args![1])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "producer failed: connection refused");
        assert!(err.failure().is_none());
    }

    #[tokio::test]
    async fn producer_matchers_need_a_producer() {
        let e = Expectations::with_builtins();
        let err = e.expect(json!(1)).call_async("to_pass", args![]).await.unwrap_err();
        assert!(matches!(err, Error::InvalidReceived(_)));
        assert!(e.expect_producer(|| async { Ok(json!(1)) }).call_async("to_pass", args![]).await.is_ok());
    }
}
