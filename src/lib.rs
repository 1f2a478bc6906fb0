pub mod errors;
pub mod config;
pub mod context;
pub mod value;
pub mod comparison;
pub mod path;
pub mod schema;
pub mod matchers;    // registry + built-in set
pub mod expect;
pub mod grammar;
pub mod validation;
pub mod poll;

use std::sync::LazyLock;

use serde_json::Value;

pub use config::{Config, PollOptions, PollSettings};
pub use context::{MatcherContext, Received};
pub use errors::{AssertionFailure, Error, FailureKind, Result};
pub use expect::{Expect, Expectations};
pub use grammar::{find_phrase, parse_phrase, phrase_regex, Keyword, PhraseMatch};
pub use matchers::{matcher_fn, Matcher, MatcherReturn, Registry, Verdict};
pub use poll::{poll, poll_verify};
pub use validation::{PollValidation, Validation, ValidationOptions};
pub use value::Expected;

/// Built-in matchers with settings read from the environment once.
/// Never mutated: [`Expectations::extend`] hands out a new factory instead.
static DEFAULT: LazyLock<Expectations> =
    LazyLock::new(|| Expectations::with_builtins().with_config(Config::from_env()));

/// The shared default factory.
pub fn expectations() -> &'static Expectations {
    &DEFAULT
}

/// Convenience: wrap a value with the built-in matchers.
pub fn expect(received: impl Into<Value>) -> Expect {
    DEFAULT.expect(received)
}

/// Resolve a phrase such as `"to not be above"` for one-shot checks.
///
/// ```
/// use phrase_assert::{get_validation, ValidationOptions};
/// use serde_json::json;
///
/// let above = get_validation("to be above", ValidationOptions::default()).unwrap();
/// assert!(above.verify(json!(2), json!(1)).is_ok());
/// assert_eq!(
///     above.verify(json!(1), json!(2)).unwrap_err().to_string(),
///     "expected 1 to be above 2"
/// );
/// ```
pub fn get_validation(phrase: &str, options: ValidationOptions) -> Result<Validation> {
    DEFAULT.validation(phrase, options)
}

/// Resolve a phrase for checks against an async producer, retried until
/// they pass or time out.
pub fn get_poll_validation(phrase: &str, options: ValidationOptions) -> Result<PollValidation> {
    DEFAULT.poll_validation(phrase, options)
}
