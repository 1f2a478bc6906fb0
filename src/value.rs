use std::fmt;
use std::sync::Arc;

use itertools::Itertools;
use regex::Regex;
use serde_json::Value;

pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A matcher argument.
#[derive(Clone)]
pub enum Expected {
    Value(Value),
    Pattern(Regex),
    Predicate(Predicate),
}

impl Expected {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Text used inside failure messages.
    pub fn display(&self) -> String {
        match self {
            Self::Value(v) => display_value(v),
            Self::Pattern(re) => format!("/{}/", re.as_str()),
            Self::Predicate(_) => "[predicate]".to_string(),
        }
    }
}

impl fmt::Debug for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<Value> for Expected {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<&Value> for Expected {
    fn from(v: &Value) -> Self {
        Self::Value(v.clone())
    }
}

impl From<&str> for Expected {
    fn from(s: &str) -> Self {
        Self::Value(Value::from(s))
    }
}

impl From<String> for Expected {
    fn from(s: String) -> Self {
        Self::Value(Value::from(s))
    }
}

impl From<i64> for Expected {
    fn from(n: i64) -> Self {
        Self::Value(Value::from(n))
    }
}

impl From<i32> for Expected {
    fn from(n: i32) -> Self {
        Self::Value(Value::from(n))
    }
}

impl From<u64> for Expected {
    fn from(n: u64) -> Self {
        Self::Value(Value::from(n))
    }
}

impl From<f64> for Expected {
    fn from(n: f64) -> Self {
        Self::Value(Value::from(n))
    }
}

impl From<bool> for Expected {
    fn from(b: bool) -> Self {
        Self::Value(Value::from(b))
    }
}

impl From<Regex> for Expected {
    fn from(re: Regex) -> Self {
        Self::Pattern(re)
    }
}

/// Build a `Vec<Expected>` from anything convertible into [`Expected`].
#[macro_export]
macro_rules! args {
    () => { ::std::vec::Vec::<$crate::Expected>::new() };
    ($($arg:expr),+ $(,)?) => { vec![$($crate::Expected::from($arg)),+] };
}

/// Render a value the way failure messages quote it: strings in single
/// quotes, containers spaced out, everything else as compact JSON.
pub fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => format!("'{s}'"),
        Value::Array(items) if items.is_empty() => "[]".to_string(),
        Value::Array(items) => format!("[ {} ]", items.iter().map(display_value).join(", ")),
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Object(map) => format!(
            "{{ {} }}",
            map.iter().map(|(k, v)| format!("{k}: {}", display_value(v))).join(", ")
        ),
        other => other.to_string(),
    }
}

/// Text form used by string matchers; strings are taken raw.
pub fn as_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
