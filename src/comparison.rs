use std::cmp::Ordering;

use serde_json::{Number, Value};

use crate::errors::{Error, Result};
use crate::value::as_text;

/// Coerce a value to a finite number: numbers pass through, strings are
/// parsed after trimming, anything else is rejected.
pub fn to_number(v: &Value) -> Result<f64> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(Error::NotANumber(as_text(v))),
    }
}

/// Same as [`to_number`] but keeps the result as a JSON value. Whole
/// numbers stay integers so messages print `1`, not `1.0`.
pub fn to_number_value(v: &Value) -> Result<Value> {
    let n = to_number(v)?;
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return Ok(Value::from(n as i64));
    }
    Number::from_f64(n)
        .map(Value::Number)
        .ok_or_else(|| Error::NotANumber(as_text(v)))
}

pub fn cmp_numeric(a: &Value, b: &Value) -> Result<Ordering> {
    let (da, db) = (to_number(a)?, to_number(b)?);
    Ok(da.partial_cmp(&db).unwrap_or(Ordering::Equal))
}

fn numbers_eq(a: &Number, b: &Number) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(da), Some(db)) => da == db,
        _ => a == b,
    }
}

/// Coercing equality: numbers, numeric strings and booleans compare by
/// numeric value; `null` only equals `null`; containers fall back to
/// ordered structural equality.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(sa), Value::String(sb)) => sa == sb,
        (Value::Bool(ba), Value::Bool(bb)) => ba == bb,
        (Value::Number(na), Value::Number(nb)) => numbers_eq(na, nb),
        (Value::Number(_) | Value::String(_) | Value::Bool(_), Value::Number(_) | Value::String(_) | Value::Bool(_)) => {
            match (scalar_number(a), scalar_number(b)) {
                (Some(da), Some(db)) => da == db,
                _ => false,
            }
        }
        _ => deep_strict_eq(a, b),
    }
}

fn scalar_number(v: &Value) -> Option<f64> {
    match v {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        other => to_number(other).ok(),
    }
}

/// Same JSON type and value. Containers compare structurally since JSON
/// values have no identity of their own.
pub fn strict_eq(a: &Value, b: &Value) -> bool {
    deep_strict_eq(a, b)
}

/// Ordered structural equality with exact type agreement.
pub fn deep_strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(na), Value::Number(nb)) => numbers_eq(na, nb),
        (Value::Array(xa), Value::Array(xb)) => {
            xa.len() == xb.len() && xa.iter().zip(xb).all(|(x, y)| deep_strict_eq(x, y))
        }
        (Value::Object(ma), Value::Object(mb)) => {
            ma.len() == mb.len()
                && ma.iter().all(|(k, v)| mb.get(k).is_some_and(|w| deep_strict_eq(v, w)))
        }
        _ => a == b,
    }
}

/// Structural equality where arrays compare as multisets at every depth.
pub fn deep_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(xa), Value::Array(xb)) => same_members(xa, xb, deep_eq),
        (Value::Object(ma), Value::Object(mb)) => {
            ma.len() == mb.len() && ma.iter().all(|(k, v)| mb.get(k).is_some_and(|w| deep_eq(v, w)))
        }
        _ => deep_strict_eq(a, b),
    }
}

/// Order-independent equality of two element lists, duplicates counted.
pub fn same_members(a: &[Value], b: &[Value], eq: fn(&Value, &Value) -> bool) -> bool {
    a.len() == b.len() && includes_members(a, b, eq)
}

/// Every element of `subset` pairs off with a distinct element of `set`.
pub fn includes_members(set: &[Value], subset: &[Value], eq: fn(&Value, &Value) -> bool) -> bool {
    let mut used = vec![false; set.len()];
    subset.iter().all(|wanted| {
        let hit = set
            .iter()
            .enumerate()
            .find(|(i, candidate)| !used[*i] && eq(candidate, wanted));
        match hit {
            Some((i, _)) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

pub fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn numeric_coercion() {
        assert_eq!(to_number(&json!("2")).unwrap(), 2.0);
        assert_eq!(to_number(&json!(" 1.5 ")).unwrap(), 1.5);
        assert_eq!(cmp_numeric(&json!("2"), &json!("1")).unwrap(), Ordering::Greater);
        let err = to_number(&json!("two")).unwrap_err();
        assert_eq!(err.to_string(), "two is not a number");
        assert!(to_number(&json!("NaN")).is_err());
        assert_eq!(to_number_value(&json!("1")).unwrap(), json!(1));
        assert_eq!(to_number_value(&json!("0.5")).unwrap(), json!(0.5));
        assert!(to_number(&json!(null)).is_err());
    }

    #[test]
    fn loose_equality_coerces_scalars() {
        assert!(loose_eq(&json!(1), &json!("1")));
        assert!(loose_eq(&json!(true), &json!(1)));
        assert!(loose_eq(&json!(1), &json!(1.0)));
        assert!(!loose_eq(&json!(null), &json!(0)));
        assert!(!loose_eq(&json!("a"), &json!(0)));
        assert!(loose_eq(&json!([1, 2]), &json!([1, 2])));
    }

    #[test]
    fn strict_equality_keeps_types() {
        assert!(strict_eq(&json!(1), &json!(1.0)));
        assert!(!strict_eq(&json!(1), &json!("1")));
        assert!(!deep_strict_eq(&json!([1, 2]), &json!([2, 1])));
    }

    #[test]
    fn deep_equality_ignores_array_order() {
        assert!(deep_eq(&json!({"a": [1, 2, {"b": [3, 4]}]}), &json!({"a": [{"b": [4, 3]}, 2, 1]})));
        assert!(!deep_eq(&json!([1, 1, 2]), &json!([1, 2, 2])));
        assert!(!deep_eq(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    }

    #[test]
    fn member_sets() {
        let set = [json!(1), json!(2), json!(3)];
        assert!(same_members(&set, &[json!(3), json!(2), json!(1)], deep_strict_eq));
        assert!(includes_members(&set, &[json!(3)], deep_strict_eq));
        assert!(!includes_members(&set, &[json!(3), json!(3)], deep_strict_eq));
        assert!(!same_members(&set, &[json!(4)], deep_strict_eq));
    }
}
