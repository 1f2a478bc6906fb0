use std::future::Future;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::comparison::to_number_value;
use crate::config::{PollOptions, PollSettings};
use crate::errors::{Error, Result};
use crate::expect::{Expect, Expectations};
use crate::grammar::{parse_phrase, Keyword, PhraseMatch};
use crate::poll::poll_with;
use crate::value::Expected;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Treat every failure as soft, whether or not the phrase says "softly".
    pub soft: bool,
}

impl ValidationOptions {
    pub fn soft() -> Self {
        Self { soft: true }
    }
}

impl Keyword {
    /// Coerce the caller's expected value into what the bound matcher takes.
    fn prepare(self, expected: Expected) -> Result<Expected> {
        match (self, expected) {
            (Self::Above | Self::Below | Self::GreaterThan | Self::LessThan, Expected::Value(v)) => {
                to_number_value(&v).map(Expected::Value)
            }
            (Self::Match, Expected::Value(Value::String(s))) => Regex::new(&s)
                .map(Expected::Pattern)
                .map_err(|e| Error::InvalidPattern(e.to_string())),
            (_, other) => Ok(other),
        }
    }
}

/// A resolved phrase, reusable for any number of checks.
#[derive(Debug, Clone)]
pub struct Validation {
    phrase: PhraseMatch,
    soft: bool,
    factory: Expectations,
}

impl Validation {
    pub fn new(phrase: PhraseMatch, options: ValidationOptions, factory: Expectations) -> Self {
        Self { soft: options.soft || phrase.soft, phrase, factory }
    }

    pub fn keyword(&self) -> Keyword {
        self.phrase.keyword
    }

    pub fn is_reverse(&self) -> bool {
        self.phrase.reverse
    }

    pub fn is_soft(&self) -> bool {
        self.soft
    }

    fn handle(&self, received: Value) -> Expect {
        let mut handle = self.factory.expect(received);
        if self.phrase.reverse {
            handle = handle.not();
        }
        if self.soft {
            handle = handle.soft();
        }
        handle
    }

    pub fn verify(&self, received: impl Into<Value>, expected: impl Into<Expected>) -> Result<()> {
        let expected = self.phrase.keyword.prepare(expected.into())?;
        self.apply(received.into(), expected)
    }

    /// Like [`Validation::verify`], awaiting matchers that answer asynchronously.
    pub async fn verify_async(&self, received: impl Into<Value>, expected: impl Into<Expected>) -> Result<()> {
        let expected = self.phrase.keyword.prepare(expected.into())?;
        self.apply_async(received.into(), expected).await
    }

    fn apply(&self, received: Value, expected: Expected) -> Result<()> {
        self.handle(received)
            .call(self.phrase.keyword.matcher_name(), vec![expected])
            .map(drop)
    }

    async fn apply_async(&self, received: Value, expected: Expected) -> Result<()> {
        self.handle(received)
            .call_async(self.phrase.keyword.matcher_name(), vec![expected])
            .await
            .map(drop)
    }
}

/// A resolved phrase checked against freshly produced values until it passes.
#[derive(Debug, Clone)]
pub struct PollValidation {
    validation: Validation,
    defaults: PollSettings,
}

impl PollValidation {
    pub fn new(validation: Validation, defaults: PollSettings) -> Self {
        Self { validation, defaults }
    }

    pub fn validation(&self) -> &Validation {
        &self.validation
    }

    pub async fn verify<P, Fut>(&self, producer: P, expected: impl Into<Expected>, options: PollOptions) -> Result<()>
    where
        P: Fn() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        // Argument errors are not worth retrying.
        let expected = self.validation.phrase.keyword.prepare(expected.into())?;
        let (timeout, interval) = options.resolve(self.defaults);
        let (producer, expected, validation) = (&producer, &expected, &self.validation);
        poll_with(
            move || async move { validation.apply_async(producer().await?, expected.clone()).await },
            timeout,
            interval,
        )
        .await
    }
}

impl Expectations {
    /// Resolve `phrase` against this factory's matchers.
    pub fn validation(&self, phrase: &str, options: ValidationOptions) -> Result<Validation> {
        let found = parse_phrase(phrase)?;
        debug!(phrase, matcher = found.keyword.matcher_name(), "validation bound");
        Ok(Validation::new(found, options, self.clone()))
    }

    pub fn poll_validation(&self, phrase: &str, options: ValidationOptions) -> Result<PollValidation> {
        let validation = self.validation(phrase, options)?;
        Ok(PollValidation::new(validation, self.config().phrase_poll))
    }
}
