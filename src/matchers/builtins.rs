use std::cmp::Ordering;
use std::ops::RangeInclusive;
use std::sync::Arc;

use itertools::Itertools;
use serde_json::Value;

use super::{Matcher, MatcherReturn, Verdict};
use crate::comparison::{
    cmp_numeric, deep_eq, deep_strict_eq, includes_members, loose_eq, same_members, strict_eq, truthy,
};
use crate::context::{MatcherContext, Producer};
use crate::errors::{Error, Result};
use crate::path::{lookup, parse_path};
use crate::schema::{JsonSchemaCompiler, SchemaCompiler};
use crate::value::{as_text, display_value, type_name, Expected};

/// Every built-in matcher, schema matching backed by [`JsonSchemaCompiler`].
pub fn all() -> Vec<Arc<dyn Matcher>> {
    vec![
        Arc::new(SimpleEqual),
        Arc::new(StrictEqual::TO_EQUAL),
        Arc::new(StrictEqual::TO_BE),
        Arc::new(DeepEqual),
        Arc::new(DeepStrictEqual),
        Arc::new(HaveMembers),
        Arc::new(IncludeMembers),
        Arc::new(Match),
        Arc::new(Contain),
        Arc::new(ContainEqual),
        Arc::new(Compare::GREATER),
        Arc::new(Compare::GREATER_OR_EQUAL),
        Arc::new(Compare::LESS),
        Arc::new(Compare::LESS_OR_EQUAL),
        Arc::new(HaveType),
        Arc::new(HaveProperty),
        Arc::new(HaveLength),
        Arc::new(MatchSchema::new(JsonSchemaCompiler)),
        Arc::new(CaseInsensitiveEqual),
        Arc::new(Satisfy),
        Arc::new(BeNull),
        Arc::new(BeTruthy),
        Arc::new(Pass),
        Arc::new(ResolveWith),
        Arc::new(RejectWith),
    ]
}

/// "expected R to VERB E", with "not" spliced in when the predicate held
/// (that message is only ever shown for negated checks).
fn describe(ctx: &MatcherContext, pass: bool, verb: &str, expected: &str) -> String {
    let received = display_value(&ctx.received);
    let not = if pass { "not " } else { "" };
    if expected.is_empty() {
        format!("expected {received} to {not}{verb}")
    } else {
        format!("expected {received} to {not}{verb} {expected}")
    }
}

fn value_arg<'a>(matcher: &'static str, args: &'a [Expected], i: usize) -> Result<&'a Value> {
    args.get(i)
        .and_then(Expected::as_value)
        .ok_or_else(|| invalid(matcher, format!("argument {} must be a JSON value", i + 1)))
}

fn invalid(matcher: &'static str, reason: impl Into<String>) -> Error {
    Error::InvalidArgument { matcher, reason: reason.into() }
}

fn reject(err: Error) -> MatcherReturn {
    MatcherReturn::Ready(Err(err))
}

fn producer_of(matcher: &'static str, ctx: &MatcherContext) -> Result<Producer> {
    ctx.producer
        .clone()
        .ok_or_else(|| Error::InvalidReceived(format!("{matcher} needs a producer")))
}

fn unsupported(matcher: &'static str, received: &Value) -> Error {
    Error::Unsupported { matcher, received: type_name(received) }
}

/// Expected member lists may be a single value.
fn as_members(v: &Value) -> Vec<Value> {
    match v {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

fn with_article(word: &str) -> String {
    match word.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => format!("an {word}"),
        _ => format!("a {word}"),
    }
}

pub struct SimpleEqual;
impl Matcher for SimpleEqual {
    fn name(&self) -> &'static str { "to_simple_equal" }
    fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
    fn check(&self, ctx: &MatcherContext, args: &[Expected]) -> MatcherReturn {
        value_arg(self.name(), args, 0)
            .map(|expected| {
                let pass = loose_eq(&ctx.received, expected);
                Verdict::new(pass, describe(ctx, pass, "equal", &display_value(expected)))
            })
            .into()
    }
}

/// Identity-style equality, registered as `to_equal` and `to_be`.
pub struct StrictEqual {
    name: &'static str,
    verb: &'static str,
}

impl StrictEqual {
    pub const TO_EQUAL: Self = Self { name: "to_equal", verb: "strictly equal" };
    pub const TO_BE: Self = Self { name: "to_be", verb: "be" };
}

impl Matcher for StrictEqual {
    fn name(&self) -> &'static str { self.name }
    fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
    fn check(&self, ctx: &MatcherContext, args: &[Expected]) -> MatcherReturn {
        value_arg(self.name, args, 0)
            .map(|expected| {
                let pass = strict_eq(&ctx.received, expected);
                Verdict::new(pass, describe(ctx, pass, self.verb, &display_value(expected)))
            })
            .into()
    }
}

pub struct DeepEqual;
impl Matcher for DeepEqual {
    fn name(&self) -> &'static str { "to_deep_equal" }
    fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
    fn check(&self, ctx: &MatcherContext, args: &[Expected]) -> MatcherReturn {
        value_arg(self.name(), args, 0)
            .map(|expected| {
                let pass = deep_eq(&ctx.received, expected);
                Verdict::new(pass, describe(ctx, pass, "deeply equal", &display_value(expected)))
            })
            .into()
    }
}

pub struct DeepStrictEqual;
impl Matcher for DeepStrictEqual {
    fn name(&self) -> &'static str { "to_deep_strict_equal" }
    fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
    fn check(&self, ctx: &MatcherContext, args: &[Expected]) -> MatcherReturn {
        value_arg(self.name(), args, 0)
            .map(|expected| {
                let pass = deep_strict_eq(&ctx.received, expected);
                Verdict::new(pass, describe(ctx, pass, "deeply strictly equal", &display_value(expected)))
            })
            .into()
    }
}

pub struct HaveMembers;
impl Matcher for HaveMembers {
    fn name(&self) -> &'static str { "to_have_members" }
    fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
    fn check(&self, ctx: &MatcherContext, args: &[Expected]) -> MatcherReturn {
        let eval = || -> Result<Verdict> {
            let expected = as_members(value_arg(self.name(), args, 0)?);
            let Value::Array(items) = &ctx.received else {
                return Err(unsupported(self.name(), &ctx.received));
            };
            let pass = same_members(items, &expected, deep_strict_eq);
            let shown = display_value(&Value::Array(expected));
            Ok(Verdict::new(pass, describe(ctx, pass, "have the same members as", &shown)))
        };
        eval().into()
    }
}

pub struct IncludeMembers;
impl Matcher for IncludeMembers {
    fn name(&self) -> &'static str { "to_include_members" }
    fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
    fn check(&self, ctx: &MatcherContext, args: &[Expected]) -> MatcherReturn {
        let eval = || -> Result<Verdict> {
            let expected = as_members(value_arg(self.name(), args, 0)?);
            let Value::Array(items) = &ctx.received else {
                return Err(unsupported(self.name(), &ctx.received));
            };
            let pass = includes_members(items, &expected, deep_strict_eq);
            let shown = display_value(&Value::Array(expected));
            Ok(Verdict::new(pass, describe(ctx, pass, "be a superset of", &shown)))
        };
        eval().into()
    }
}

/// Regex match, or substring match for a plain string argument.
pub struct Match;
impl Matcher for Match {
    fn name(&self) -> &'static str { "to_match" }
    fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
    fn check(&self, ctx: &MatcherContext, args: &[Expected]) -> MatcherReturn {
        let text = as_text(&ctx.received);
        let (pass, expected) = match args.first() {
            Some(e @ Expected::Pattern(re)) => (re.is_match(&text), e),
            Some(e @ Expected::Value(Value::String(needle))) => (text.contains(needle.as_str()), e),
            _ => return reject(invalid(self.name(), "expected a pattern or a string")),
        };
        Verdict::new(pass, describe(ctx, pass, "match", &expected.display())).into()
    }
}

/// Substring containment for strings, element containment for arrays.
/// Other receivers are rejected rather than judged.
pub struct Contain;
impl Matcher for Contain {
    fn name(&self) -> &'static str { "to_contain" }
    fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
    fn check(&self, ctx: &MatcherContext, args: &[Expected]) -> MatcherReturn {
        let eval = || -> Result<Verdict> {
            let expected = value_arg(self.name(), args, 0)?;
            let pass = match &ctx.received {
                Value::String(s) => s.contains(as_text(expected).as_str()),
                Value::Array(items) => items.iter().any(|item| deep_strict_eq(item, expected)),
                other => return Err(unsupported(self.name(), other)),
            };
            Ok(Verdict::new(pass, describe(ctx, pass, "include", &display_value(expected))))
        };
        eval().into()
    }
}

pub struct ContainEqual;
impl Matcher for ContainEqual {
    fn name(&self) -> &'static str { "to_contain_equal" }
    fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
    fn check(&self, ctx: &MatcherContext, args: &[Expected]) -> MatcherReturn {
        let eval = || -> Result<Verdict> {
            let expected = value_arg(self.name(), args, 0)?;
            let Value::Array(items) = &ctx.received else {
                return Err(unsupported(self.name(), &ctx.received));
            };
            let pass = items.iter().any(|item| deep_eq(item, expected));
            Ok(Verdict::new(pass, describe(ctx, pass, "contain equal", &display_value(expected))))
        };
        eval().into()
    }
}

/// Numeric ordering; both sides are coerced to numbers first.
pub struct Compare {
    name: &'static str,
    accept: fn(Ordering) -> bool,
    verb: &'static str,
    negated_verb: &'static str,
}

impl Compare {
    pub const GREATER: Self = Self {
        name: "to_be_greater_than",
        accept: Ordering::is_gt,
        verb: "be above",
        negated_verb: "be at most",
    };
    pub const GREATER_OR_EQUAL: Self = Self {
        name: "to_be_greater_than_or_equal",
        accept: Ordering::is_ge,
        verb: "be at least",
        negated_verb: "be below",
    };
    pub const LESS: Self = Self {
        name: "to_be_less_than",
        accept: Ordering::is_lt,
        verb: "be below",
        negated_verb: "be at least",
    };
    pub const LESS_OR_EQUAL: Self = Self {
        name: "to_be_less_than_or_equal",
        accept: Ordering::is_le,
        verb: "be at most",
        negated_verb: "be above",
    };
}

impl Matcher for Compare {
    fn name(&self) -> &'static str { self.name }
    fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
    fn check(&self, ctx: &MatcherContext, args: &[Expected]) -> MatcherReturn {
        let eval = || -> Result<Verdict> {
            let expected = value_arg(self.name, args, 0)?;
            let pass = (self.accept)(cmp_numeric(&ctx.received, expected)?);
            // Negated failures read as the complementary bound, e.g. "at most".
            let verb = if pass { self.negated_verb } else { self.verb };
            let received = display_value(&ctx.received);
            Ok(Verdict::new(pass, format!("expected {received} to {verb} {}", display_value(expected))))
        };
        eval().into()
    }
}

pub struct HaveType;
impl Matcher for HaveType {
    fn name(&self) -> &'static str { "to_have_type" }
    fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
    fn check(&self, ctx: &MatcherContext, args: &[Expected]) -> MatcherReturn {
        let Some(Value::String(wanted)) = args.first().and_then(Expected::as_value) else {
            return reject(invalid(self.name(), "expected a type name"));
        };
        let wanted = wanted.to_lowercase();
        let pass = type_name(&ctx.received) == wanted;
        Verdict::new(pass, describe(ctx, pass, "be", &with_article(&wanted))).into()
    }
}

/// Key presence along a property path, optionally with value equality.
pub struct HaveProperty;
impl Matcher for HaveProperty {
    fn name(&self) -> &'static str { "to_have_property" }
    fn arity(&self) -> RangeInclusive<usize> { 1..=2 }
    fn check(&self, ctx: &MatcherContext, args: &[Expected]) -> MatcherReturn {
        let eval = || -> Result<Verdict> {
            let key = as_text(value_arg(self.name(), args, 0)?);
            let found = lookup(&ctx.received, &parse_path(&key)?);
            let wanted = match args.get(1) {
                Some(_) => Some(value_arg(self.name(), args, 1)?),
                None => None,
            };
            let (pass, expected) = match wanted {
                Some(value) => (
                    found.is_some_and(|v| deep_strict_eq(v, value)),
                    format!("'{key}' of {}", display_value(value)),
                ),
                None => (found.is_some(), format!("'{key}'")),
            };
            Ok(Verdict::new(pass, describe(ctx, pass, "have property", &expected)))
        };
        eval().into()
    }
}

pub struct HaveLength;
impl Matcher for HaveLength {
    fn name(&self) -> &'static str { "to_have_length" }
    fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
    fn check(&self, ctx: &MatcherContext, args: &[Expected]) -> MatcherReturn {
        let eval = || -> Result<Verdict> {
            let expected = value_arg(self.name(), args, 0)?;
            let wanted = expected
                .as_u64()
                .ok_or_else(|| invalid(self.name(), "expected a non-negative integer"))?;
            let len = match &ctx.received {
                Value::String(s) => s.chars().count(),
                Value::Array(items) => items.len(),
                Value::Object(map) => map.len(),
                other => return Err(unsupported(self.name(), other)),
            };
            let pass = len as u64 == wanted;
            Ok(Verdict::new(pass, describe(ctx, pass, "have length", &wanted.to_string())))
        };
        eval().into()
    }
}

/// Schema conformance through an injected [`SchemaCompiler`].
pub struct MatchSchema {
    compiler: Arc<dyn SchemaCompiler>,
}

impl MatchSchema {
    pub fn new<C: SchemaCompiler + 'static>(compiler: C) -> Self {
        Self { compiler: Arc::new(compiler) }
    }
}

impl Matcher for MatchSchema {
    fn name(&self) -> &'static str { "to_match_schema" }
    fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
    fn check(&self, ctx: &MatcherContext, args: &[Expected]) -> MatcherReturn {
        let eval = || -> Result<Verdict> {
            let schema = value_arg(self.name(), args, 0)?;
            let report = self.compiler.compile(schema)?.validate(&ctx.received);
            let message = if report.valid {
                describe(ctx, true, "match schema", "")
            } else {
                let issues = report
                    .errors
                    .iter()
                    .map(|e| format!("{} {} ({})", e.path_in_instance, e.message, e.path_in_schema))
                    .join("; ");
                format!("{}: {issues}", describe(ctx, false, "match schema", ""))
            };
            Ok(Verdict::new(report.valid, message))
        };
        eval().into()
    }
}

pub struct CaseInsensitiveEqual;
impl Matcher for CaseInsensitiveEqual {
    fn name(&self) -> &'static str { "to_case_insensitive_equal" }
    fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
    fn check(&self, ctx: &MatcherContext, args: &[Expected]) -> MatcherReturn {
        value_arg(self.name(), args, 0)
            .map(|expected| {
                let pass = as_text(&ctx.received).to_lowercase() == as_text(expected).to_lowercase();
                Verdict::new(pass, describe(ctx, pass, "case insensitively equal", &display_value(expected)))
            })
            .into()
    }
}

pub struct Satisfy;
impl Matcher for Satisfy {
    fn name(&self) -> &'static str { "to_satisfy" }
    fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
    fn check(&self, ctx: &MatcherContext, args: &[Expected]) -> MatcherReturn {
        let Some(expected @ Expected::Predicate(predicate)) = args.first() else {
            return reject(invalid(self.name(), "expected a predicate"));
        };
        let pass = predicate(&ctx.received);
        Verdict::new(pass, describe(ctx, pass, "satisfy", &expected.display())).into()
    }
}

pub struct BeNull;
impl Matcher for BeNull {
    fn name(&self) -> &'static str { "to_be_null" }
    fn arity(&self) -> RangeInclusive<usize> { 0..=0 }
    fn check(&self, ctx: &MatcherContext, _args: &[Expected]) -> MatcherReturn {
        let pass = ctx.received.is_null();
        Verdict::new(pass, describe(ctx, pass, "be null", "")).into()
    }
}

pub struct BeTruthy;
impl Matcher for BeTruthy {
    fn name(&self) -> &'static str { "to_be_truthy" }
    fn arity(&self) -> RangeInclusive<usize> { 0..=0 }
    fn check(&self, ctx: &MatcherContext, _args: &[Expected]) -> MatcherReturn {
        let pass = truthy(&ctx.received);
        Verdict::new(pass, describe(ctx, pass, "be truthy", "")).into()
    }
}

/// The producer completes without an error.
pub struct Pass;
impl Matcher for Pass {
    fn name(&self) -> &'static str { "to_pass" }
    fn arity(&self) -> RangeInclusive<usize> { 0..=0 }
    fn takes_producer(&self) -> bool { true }
    fn check(&self, ctx: &MatcherContext, _args: &[Expected]) -> MatcherReturn {
        let producer = match producer_of(self.name(), ctx) {
            Ok(p) => p,
            Err(e) => return reject(e),
        };
        MatcherReturn::deferred(async move {
            Ok::<_, Error>(match producer().await {
                Ok(_) => Verdict::new(true, "expected producer to not pass"),
                Err(err) => Verdict::new(false, format!("expected producer to pass, but it failed with: {err}")),
            })
        })
    }
}

/// The producer yields a value deep-strictly equal to the expected one.
pub struct ResolveWith;
impl Matcher for ResolveWith {
    fn name(&self) -> &'static str { "to_resolve_with" }
    fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
    fn takes_producer(&self) -> bool { true }
    fn check(&self, ctx: &MatcherContext, args: &[Expected]) -> MatcherReturn {
        let eval = || -> Result<(Producer, Value)> {
            Ok((producer_of(self.name(), ctx)?, value_arg(self.name(), args, 0)?.clone()))
        };
        let (producer, expected) = match eval() {
            Ok(found) => found,
            Err(e) => return reject(e),
        };
        MatcherReturn::deferred(async move {
            let shown = display_value(&expected);
            Ok::<_, Error>(match producer().await {
                Ok(value) if deep_strict_eq(&value, &expected) => {
                    Verdict::new(true, format!("expected producer to not resolve with {shown}"))
                }
                Ok(value) => Verdict::new(
                    false,
                    format!("expected producer to resolve with {shown}, but got {}", display_value(&value)),
                ),
                Err(err) => Verdict::new(
                    false,
                    format!("expected producer to resolve with {shown}, but it failed with: {err}"),
                ),
            })
        })
    }
}

/// The producer fails; with an argument, its error text must contain the
/// string or match the pattern.
pub struct RejectWith;
impl Matcher for RejectWith {
    fn name(&self) -> &'static str { "to_reject_with" }
    fn arity(&self) -> RangeInclusive<usize> { 0..=1 }
    fn takes_producer(&self) -> bool { true }
    fn check(&self, ctx: &MatcherContext, args: &[Expected]) -> MatcherReturn {
        let producer = match producer_of(self.name(), ctx) {
            Ok(p) => p,
            Err(e) => return reject(e),
        };
        let wanted = args.first().cloned();
        if !matches!(wanted, None | Some(Expected::Pattern(_) | Expected::Value(Value::String(_)))) {
            return reject(invalid(self.name(), "expected a pattern or a string"));
        }
        MatcherReturn::deferred(async move {
            let shown = wanted.as_ref().map(|w| format!(" with {}", w.display())).unwrap_or_default();
            Ok::<_, Error>(match producer().await {
                Ok(value) => Verdict::new(
                    false,
                    format!("expected producer to reject{shown}, but it resolved with {}", display_value(&value)),
                ),
                Err(err) => {
                    let text = err.to_string();
                    let pass = match &wanted {
                        Some(Expected::Pattern(re)) => re.is_match(&text),
                        Some(Expected::Value(Value::String(needle))) => text.contains(needle.as_str()),
                        _ => true,
                    };
                    let not = if pass { "not " } else { "" };
                    Verdict::new(pass, format!("expected producer to {not}reject{shown}, but it failed with '{text}'"))
                }
            })
        })
    }
}
