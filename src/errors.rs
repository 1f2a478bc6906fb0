use std::ops::RangeInclusive;
use std::time::Duration;

use thiserror::Error;

/// Whether a failed assertion should abort the surrounding test or be collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Hard,
    Soft,
}

/// A matcher verdict that did not line up with the `not` modifier.
#[derive(Debug, Error)]
pub enum AssertionFailure {
    #[error("{message}")]
    Hard { message: String },

    // `cause` is the equivalent hard failure, same message.
    #[error("{message}")]
    Soft {
        message: String,
        #[source]
        cause: Box<AssertionFailure>,
    },
}

impl AssertionFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            FailureKind::Hard => Self::Hard { message },
            FailureKind::Soft => Self::Soft {
                cause: Box::new(Self::Hard { message: message.clone() }),
                message,
            },
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Hard { .. } => FailureKind::Hard,
            Self::Soft { .. } => FailureKind::Soft,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Hard { message } | Self::Soft { message, .. } => message,
        }
    }

    /// Type name in the shape test reporters print it.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hard { .. } => "AssertionError",
            Self::Soft { .. } => "SoftAssertionError",
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("validation '{0}' is not supported")]
    ValidationNotSupported(String),

    #[error("{0} matcher not found")]
    MatcherNotFound(String),

    #[error("{0} is not a number")]
    NotANumber(String),

    #[error(transparent)]
    Assertion(#[from] AssertionFailure),

    #[error("{}", timeout_message(.last_error))]
    PollTimeout {
        timeout: Duration,
        last_error: Option<Box<Error>>,
    },

    #[error("{matcher} accepts {} arguments, got {got}", arity_range(.expected))]
    Arity {
        matcher: String,
        expected: RangeInclusive<usize>,
        got: usize,
    },

    #[error("{0} is asynchronous and must be awaited")]
    AsyncMatcher(String),

    #[error("invalid received value: {0}")]
    InvalidReceived(String),

    /// A producer could not come up with a value this attempt.
    #[error("producer failed: {0}")]
    Producer(String),

    #[error("invalid argument for {matcher}: {reason}")]
    InvalidArgument {
        matcher: &'static str,
        reason: String,
    },

    #[error("invalid property path: {0}")]
    InvalidPath(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("{matcher} does not support received value of type {received}")]
    Unsupported {
        matcher: &'static str,
        received: &'static str,
    },

    #[error("schema error: {0}")]
    Schema(String),

    #[error("config error: {0}")]
    Config(String),
}

fn arity_range(range: &RangeInclusive<usize>) -> String {
    if range.start() == range.end() {
        range.start().to_string()
    } else {
        format!("{} to {}", range.start(), range.end())
    }
}

fn timeout_message(last_error: &Option<Box<Error>>) -> String {
    match last_error {
        Some(err) => err.to_string(),
        None => "promise was not settled before timeout".to_string(),
    }
}

impl Error {
    /// The assertion failure behind this error, looking through poll timeouts.
    pub fn failure(&self) -> Option<&AssertionFailure> {
        match self {
            Self::Assertion(failure) => Some(failure),
            Self::PollTimeout { last_error: Some(err), .. } => err.failure(),
            _ => None,
        }
    }

    pub fn is_soft(&self) -> bool {
        self.failure().is_some_and(|f| f.kind() == FailureKind::Soft)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
