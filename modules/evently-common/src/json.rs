//! JSON number normalization.
//!
//! Key-value stores commonly hold every number as a decimal, so a capacity
//! written as `100` can come back as `100.0`. Whole numbers are always
//! re-encoded as JSON integers; fractional numbers stay floats.

use serde_json::{Number, Value};

/// Recursively rewrite whole-valued floats as integers.
pub fn normalize_numbers(value: Value) -> Value {
    match value {
        Value::Number(n) => Value::Number(normalize_number(n)),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, normalize_numbers(v)))
                .collect(),
        ),
        other => other,
    }
}

fn normalize_number(n: Number) -> Number {
    if !n.is_f64() {
        return n;
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(&f) => {
            Number::from(f as i64)
        }
        _ => n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn whole_float_becomes_integer() {
        let out = normalize_numbers(json!(100.0));
        assert!(out.is_i64());
        assert_eq!(out, json!(100));
    }

    #[test]
    fn fractional_float_is_kept() {
        assert_eq!(normalize_numbers(json!(2.5)), json!(2.5));
    }

    #[test]
    fn integers_pass_through() {
        assert_eq!(normalize_numbers(json!(-7)), json!(-7));
        assert_eq!(normalize_numbers(json!(u64::MAX)), json!(u64::MAX));
    }

    #[test]
    fn nested_values_are_normalized() {
        let input = json!({
            "capacity": 50.0,
            "tiers": [{"price": 10.0}, {"price": 12.75}],
            "title": "Launch"
        });
        let out = normalize_numbers(input);
        assert_eq!(out["capacity"], json!(50));
        assert!(out["capacity"].is_i64());
        assert!(out["tiers"][0]["price"].is_i64());
        assert_eq!(out["tiers"][1]["price"], json!(12.75));
        assert_eq!(out["title"], json!("Launch"));
    }

    #[test]
    fn out_of_range_float_stays_float() {
        let out = normalize_numbers(json!(1e300));
        assert!(out.is_f64());
    }
}
