use serde_json::{Number, Value};

use crate::constants::RESERVED_KEYS;
use crate::error::RecordShapeError;
use crate::types::Record;

/// Bounds of the i64 and u64 ranges as f64; the upper ones are exclusive
/// (2^63 and 2^64 are exact floats, one past the largest integer).
const I64_MIN: f64 = -9_223_372_036_854_775_808.0;
const I64_END: f64 = 9_223_372_036_854_775_808.0;
const U64_END: f64 = 18_446_744_073_709_551_616.0;

/// Arrays and objects nested deeper than this are refused instead of
/// recursing further. Matches serde_json's parser limit.
pub const MAX_DEPTH: usize = 128;

/// Canonical form of a record: compact JSON, object keys sorted bytewise at
/// every level, arrays in order. Top-level `object_id`/`audit`/`dq` blocks
/// are left out so hashing an enriched record reproduces its original id.
pub fn canonicalize(value: &Value) -> Result<String, RecordShapeError> {
    match value {
        Value::Object(record) => canonicalize_record(record),
        other => Err(RecordShapeError::NotAnObject { found: kind_name(other) }),
    }
}

pub fn canonicalize_record(record: &Record) -> Result<String, RecordShapeError> {
    let mut out = String::new();
    write_object(&mut out, record, &RESERVED_KEYS, 1)?;
    Ok(out)
}

/// Canonical form of an arbitrary JSON value. Used for best-effort ids of
/// array elements that are not records.
pub fn canonicalize_any(value: &Value) -> Result<String, RecordShapeError> {
    let mut out = String::new();
    write_value(&mut out, value, 0)?;
    Ok(out)
}

/// Short name of a JSON value's type, for diagnostics
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn write_value(out: &mut String, value: &Value, depth: usize) -> Result<(), RecordShapeError> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => write_number(out, n),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            let depth = descend(depth)?;
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item, depth)?;
            }
            out.push(']');
        }
        Value::Object(map) => write_object(out, map, &[], descend(depth)?)?,
    }
    Ok(())
}

fn descend(depth: usize) -> Result<usize, RecordShapeError> {
    if depth >= MAX_DEPTH {
        return Err(RecordShapeError::Unserializable(format!(
            "nesting deeper than {} levels",
            MAX_DEPTH
        )));
    }
    Ok(depth + 1)
}

fn write_object(out: &mut String, map: &Record, skip: &[&str], depth: usize) -> Result<(), RecordShapeError> {
    let mut entries: Vec<(&String, &Value)> =
        map.iter().filter(|(k, _)| !skip.contains(&k.as_str())).collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    out.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(out, key);
        out.push(':');
        write_value(out, value, depth)?;
    }
    out.push('}');
    Ok(())
}

fn write_string(out: &mut String, s: &str) {
    out.push_str(&Value::String(s.to_owned()).to_string());
}

/// Integral floats within the 64-bit integer range are written the way the
/// equal integer literal is. Everything else keeps serde_json's shortest
/// round-trip form; integers never get there since serde_json stores them
/// as i64/u64.
fn write_number(out: &mut String, n: &Number) {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 => {
            if (I64_MIN..I64_END).contains(&f) {
                out.push_str(&(f as i64).to_string());
            } else if (0.0..U64_END).contains(&f) {
                out.push_str(&(f as u64).to_string());
            } else {
                out.push_str(&n.to_string());
            }
        }
        _ => out.push_str(&n.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_sorted_at_every_level() {
        let value = json!({"b": 1, "a": {"z": true, "m": null}, "c": [3, {"y": 1, "x": 2}]});
        assert_eq!(
            canonicalize(&value).unwrap(),
            r#"{"a":{"m":null,"z":true},"b":1,"c":[3,{"x":2,"y":1}]}"#
        );
    }

    #[test]
    fn test_field_order_is_irrelevant() {
        let first: Value = serde_json::from_str(r#"{"lat": 1.5, "city": "Pune", "tags": ["a", "b"]}"#).unwrap();
        let second: Value = serde_json::from_str(r#"{"tags": ["a", "b"], "city": "Pune", "lat": 1.5}"#).unwrap();
        assert_eq!(canonicalize(&first).unwrap(), canonicalize(&second).unwrap());
    }

    #[test]
    fn test_array_order_is_preserved() {
        let first = json!({"v": [1, 2]});
        let second = json!({"v": [2, 1]});
        assert_ne!(canonicalize(&first).unwrap(), canonicalize(&second).unwrap());
    }

    #[test]
    fn test_enrichment_blocks_are_excluded() {
        let plain = json!({"id": "a1", "balance": 10});
        let enriched = json!({
            "id": "a1",
            "balance": 10,
            "object_id": "deadbeef",
            "audit": {"source": "x"},
            "dq": {"passed": true, "issues": []}
        });
        assert_eq!(canonicalize(&plain).unwrap(), canonicalize(&enriched).unwrap());
    }

    #[test]
    fn test_nested_reserved_names_are_kept() {
        let value = json!({"meta": {"audit": "kept"}});
        assert_eq!(canonicalize(&value).unwrap(), r#"{"meta":{"audit":"kept"}}"#);
    }

    #[test]
    fn test_integral_floats_match_integers() {
        assert_eq!(canonicalize(&json!({"n": 1.0})).unwrap(), canonicalize(&json!({"n": 1})).unwrap());
        assert_eq!(canonicalize(&json!({"n": 12.3})).unwrap(), r#"{"n":12.3}"#);
    }

    #[test]
    fn test_large_integral_floats_match_integers() {
        let float: Value = serde_json::from_str(r#"{"n": 1e16}"#).unwrap();
        let integer: Value = serde_json::from_str(r#"{"n": 10000000000000000}"#).unwrap();
        assert_eq!(canonicalize(&float).unwrap(), r#"{"n":10000000000000000}"#);
        assert_eq!(canonicalize(&float).unwrap(), canonicalize(&integer).unwrap());

        let negative: Value = serde_json::from_str(r#"{"n": -4.5e18}"#).unwrap();
        assert_eq!(canonicalize(&negative).unwrap(), r#"{"n":-4500000000000000000}"#);

        let unsigned: Value = serde_json::from_str(r#"{"n": 1.2e19}"#).unwrap();
        let unsigned_int: Value = serde_json::from_str(r#"{"n": 12000000000000000000}"#).unwrap();
        assert_eq!(canonicalize(&unsigned).unwrap(), canonicalize(&unsigned_int).unwrap());
    }

    #[test]
    fn test_floats_beyond_u64_are_stable() {
        let value: Value = serde_json::from_str(r#"{"n": 1e300}"#).unwrap();
        let once = canonicalize(&value).unwrap();
        let reparsed: Value = serde_json::from_str(&once).unwrap();
        assert_eq!(canonicalize(&reparsed).unwrap(), once);
    }

    #[test]
    fn test_excessive_nesting_is_unserializable() {
        let mut nested = json!("leaf");
        for _ in 0..MAX_DEPTH + 5 {
            nested = json!([nested]);
        }
        let err = canonicalize(&json!({"deep": nested})).unwrap_err();
        assert!(matches!(err, RecordShapeError::Unserializable(_)));

        let mut shallow = json!("leaf");
        for _ in 0..MAX_DEPTH - 2 {
            shallow = json!([shallow]);
        }
        assert!(canonicalize(&json!({"deep": shallow})).is_ok());
    }

    #[test]
    fn test_canonical_form_is_a_fixed_point() {
        let value = json!({"z": "é\"q", "a": [1.0, -2.5, {"k": null}], "m": {"b": false, "a": 7}});
        let once = canonicalize(&value).unwrap();
        let reparsed: Value = serde_json::from_str(&once).unwrap();
        assert_eq!(canonicalize(&reparsed).unwrap(), once);
    }

    #[test]
    fn test_non_object_is_a_shape_error() {
        assert_eq!(
            canonicalize(&json!([1, 2])),
            Err(RecordShapeError::NotAnObject { found: "array" })
        );
        assert_eq!(canonicalize_any(&json!("NA")).unwrap(), r#""NA""#);
    }
}
