use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use crate::errors::Result;

/// Async source of fresh values, re-invoked on every poll attempt. An `Err`
/// counts as a failed attempt, never as a value.
pub type Producer = Arc<dyn Fn() -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// What an [`Expect`](crate::expect::Expect) handle wraps.
#[derive(Clone)]
pub enum Received {
    Value(Value),
    Producer(Producer),
}

impl Received {
    pub fn producer<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self::Producer(Arc::new(move || f().boxed()))
    }
}

impl fmt::Debug for Received {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

impl From<Value> for Received {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// State a matcher sees for one invocation.
/// In poll mode `received` is the value produced for the current attempt.
/// Matchers that judge the source itself get it in `producer` instead, with
/// `received` left `null`.
#[derive(Clone)]
pub struct MatcherContext {
    pub received: Value,
    pub producer: Option<Producer>,
    pub is_not: bool,
    pub is_soft: bool,
    pub is_poll: bool,
}

impl MatcherContext {
    pub fn new(received: impl Into<Value>) -> Self {
        Self {
            received: received.into(),
            producer: None,
            is_not: false,
            is_soft: false,
            is_poll: false,
        }
    }

    pub fn with_producer(mut self, producer: Producer) -> Self {
        self.producer = Some(producer);
        self
    }
}

impl fmt::Debug for MatcherContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatcherContext")
            .field("received", &self.received)
            .field("producer", &self.producer.as_ref().map(|_| ".."))
            .field("is_not", &self.is_not)
            .field("is_soft", &self.is_soft)
            .field("is_poll", &self.is_poll)
            .finish()
    }
}
