//! Canonical JSON serialization.
//!
//! Anything that gets hashed or signed in WavePay goes through
//! [`canonical_json`] first: object keys sorted lexicographically at every
//! nesting level, compact separators, no insignificant whitespace. The rule
//! exists because the attestation digest and the transaction signature are
//! recomputed independently by the builder and the verifier — if the two
//! sides ever serialize the same value to different bytes, every signature
//! in the system silently stops verifying.
//!
//! Numbers are formatted by `serde_json`'s own writer (ryu for floats), which
//! is a pure function of the parsed value. The contract is therefore over
//! *parsed* values: `1.50` and `1.5` are the same number and canonicalize
//! identically. Monetary amounts never rely on this — they travel as
//! fixed-point decimal strings (see `transaction::types::Amount`).

use serde_json::Value;

/// Serializes a JSON value into its canonical string form.
///
/// Determinism contract: two `Value`s that compare equal always produce
/// byte-identical output, regardless of the key order of the documents they
/// were parsed from.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => {
            // serde_json handles escaping; a String never fails to serialize.
            out.push_str(&serde_json::to_string(s).unwrap_or_default());
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key).unwrap_or_default());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted() {
        let v = json!({"zulu": 1, "alpha": 2, "mike": 3});
        assert_eq!(canonical_json(&v), r#"{"alpha":2,"mike":3,"zulu":1}"#);
    }

    #[test]
    fn nested_keys_are_sorted() {
        let v = json!({"outer": {"b": 1, "a": {"d": 4, "c": 3}}});
        assert_eq!(
            canonical_json(&v),
            r#"{"outer":{"a":{"c":3,"d":4},"b":1}}"#
        );
    }

    #[test]
    fn key_order_of_source_document_is_irrelevant() {
        let a: Value = serde_json::from_str(r#"{"x": 1, "y": {"p": true, "q": null}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"y": {"q": null, "p": true}, "x": 1}"#).unwrap();
        assert_eq!(canonical_json(&a), canonical_json(&b));
    }

    #[test]
    fn arrays_preserve_order() {
        // Array order is semantic, not presentational. Never sort it.
        let v = json!([3, 1, 2]);
        assert_eq!(canonical_json(&v), "[3,1,2]");
    }

    #[test]
    fn scalars() {
        assert_eq!(canonical_json(&json!(null)), "null");
        assert_eq!(canonical_json(&json!(true)), "true");
        assert_eq!(canonical_json(&json!(42)), "42");
        assert_eq!(canonical_json(&json!("hi")), r#""hi""#);
    }

    #[test]
    fn strings_are_escaped() {
        let v = json!({"note": "line\nbreak \"quoted\""});
        assert_eq!(
            canonical_json(&v),
            r#"{"note":"line\nbreak \"quoted\""}"#
        );
    }

    #[test]
    fn floats_are_stable() {
        let a: Value = serde_json::from_str("{\"v\": 1.5}").unwrap();
        let b: Value = serde_json::from_str("{\"v\": 1.50}").unwrap();
        // Same parsed value, same canonical bytes.
        assert_eq!(canonical_json(&a), canonical_json(&b));
    }

    #[test]
    fn empty_containers() {
        assert_eq!(canonical_json(&json!({})), "{}");
        assert_eq!(canonical_json(&json!([])), "[]");
    }
}
