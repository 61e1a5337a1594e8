//! Canonical JSON encoding of webhook bodies.
//!
//! Postal signs the output of Ruby's `to_json`, which runs strings through
//! ERB's `json_escape`. That escapes the two JavaScript line terminators
//! (U+2028, U+2029) and the HTML-sensitive `&`, `<` and `>` as `\uXXXX`.
//! Verification only succeeds if the body is re-encoded to exactly the same
//! bytes, so this module writes compact JSON with those escapes applied.

use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Encode `value` as compact JSON with Postal's escaping rules.
///
/// Object keys are written in the order the map yields them. With
/// `serde_json`'s `preserve_order` feature that is the order in which they
/// were parsed from the request.
pub fn canonicalize(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

/// Convert any serializable body into its canonical bytes.
///
/// Fails only when `body` has no JSON representation, e.g. a map whose keys
/// are not strings.
pub fn canonical_bytes<T: Serialize + ?Sized>(body: &T) -> Result<Vec<u8>, serde_json::Error> {
    let value = serde_json::to_value(body)?;
    Ok(canonicalize(&value).into_bytes())
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => write_number(out, n),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => write_object(out, map),
    }
}

fn write_object(out: &mut String, map: &Map<String, Value>) {
    out.push('{');
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(out, key);
        out.push(':');
        write_value(out, value);
    }
    out.push('}');
}

fn write_number(out: &mut String, n: &Number) {
    match n.as_f64() {
        Some(f) if n.is_f64() => write_float(out, f),
        _ => out.push_str(&n.to_string()),
    }
}

/// Largest decimal exponent Ruby prints without scientific notation.
const FLOAT_FIXED_MAX_EXPONENT: i32 = 16;

/// Smallest decimal exponent Ruby prints without scientific notation.
const FLOAT_FIXED_MIN_EXPONENT: i32 = -4;

/// Write a float the way Ruby's `Float#to_s` does.
///
/// The digits are the shortest round-trip representation. Values with a
/// decimal exponent in `-4..16` print in fixed notation with at least one
/// fractional digit (`1.0`, `0.0001`), everything else as `1.0e+22` or
/// `1.5e-05`.
fn write_float(out: &mut String, f: f64) {
    // `{:e}` yields the shortest round-trip digits, e.g. "-1.2345e22"
    let formatted = format!("{:e}", f);
    let (mantissa, exponent) = match formatted.split_once('e') {
        Some(parts) => parts,
        None => {
            out.push_str(&formatted);
            return;
        }
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    out.push_str(sign);

    if exponent >= FLOAT_FIXED_MAX_EXPONENT || exponent < FLOAT_FIXED_MIN_EXPONENT {
        out.push_str(&digits[..1]);
        out.push('.');
        out.push_str(if digits.len() > 1 { &digits[1..] } else { "0" });
        out.push_str(&format!("e{:+03}", exponent));
    } else if exponent >= 0 {
        let int_len = exponent as usize + 1;
        if digits.len() <= int_len {
            out.push_str(&digits);
            out.push_str(&"0".repeat(int_len - digits.len()));
            out.push_str(".0");
        } else {
            out.push_str(&digits[..int_len]);
            out.push('.');
            out.push_str(&digits[int_len..]);
        }
    } else {
        out.push_str("0.");
        out.push_str(&"0".repeat((-exponent - 1) as usize));
        out.push_str(&digits);
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\u{00}'..='\u{1f}' => push_unicode_escape(out, c),
            // json_escape
            '&' | '<' | '>' | '\u{2028}' | '\u{2029}' => push_unicode_escape(out, c),
            _ => out.push(c),
        }
    }
    out.push('"');
}

fn push_unicode_escape(out: &mut String, c: char) {
    out.push_str(&format!("\\u{:04x}", c as u32));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_html_characters_escaped() {
        let body = json!({"a": "<script>&"});

        assert_eq!(
            canonicalize(&body),
            "{\"a\":\"\\u003cscript\\u003e\\u0026\"}"
        );
    }

    #[test]
    fn test_line_separators_escaped() {
        let body = json!({"text": "one\u{2028}two\u{2029}three"});
        let canonical = canonicalize(&body);

        assert_eq!(canonical, "{\"text\":\"one\\u2028two\\u2029three\"}");
        assert!(!canonical.contains('\u{2028}'));
        assert!(!canonical.contains('\u{2029}'));
    }

    #[test]
    fn test_matches_serde_json_without_special_characters() {
        let body = json!({
            "id": 1,
            "event": "MessageDelivered",
            "payload": {
                "message": {"id": 42, "subject": "Hi \"there\"\n", "spam_status": null},
                "status": "Sent",
                "details": ["a", 2.5, true, false, -3],
                "time": 1700000000.123
            }
        });

        assert_eq!(canonicalize(&body), serde_json::to_string(&body).unwrap());
    }

    #[test]
    fn test_control_characters() {
        let body = json!("tab\there\u{01}\u{1f}\u{7f}/");

        assert_eq!(
            canonicalize(&body),
            "\"tab\\there\\u0001\\u001f\u{7f}/\""
        );
    }

    #[test]
    fn test_float_formatting_follows_ruby() {
        let cases = [
            (1.0, "1.0"),
            (0.0, "0.0"),
            (2.5, "2.5"),
            (-3.75, "-3.75"),
            (1700000000.25, "1700000000.25"),
            (100.0, "100.0"),
            (1e15, "1000000000000000.0"),
            (1e16, "1.0e+16"),
            (1e22, "1.0e+22"),
            (1.2345678901234568e22, "1.2345678901234568e+22"),
            (0.0001, "0.0001"),
            (0.00012, "0.00012"),
            (0.00001, "1.0e-05"),
            (1.5e-7, "1.5e-07"),
            (-2.5e-300, "-2.5e-300"),
        ];

        for (value, expected) in cases {
            assert_eq!(canonicalize(&json!(value)), expected, "formatting {:?}", value);
        }
    }

    #[test]
    fn test_integers_written_verbatim() {
        let body: Value = serde_json::from_str(r#"[0,-7,9007199254740993,18446744073709551615]"#).unwrap();

        assert_eq!(canonicalize(&body), "[0,-7,9007199254740993,18446744073709551615]");
    }

    #[test]
    fn test_large_integer_literal_falls_back_to_float() {
        // Beyond u64, serde_json parses the literal as f64
        let body: Value = serde_json::from_str("12345678901234567890123").unwrap();

        assert_eq!(canonicalize(&body), "1.2345678901234568e+22");
    }

    #[test]
    fn test_preserves_received_key_order() {
        let body: Value = serde_json::from_str(r#"{"zeta":1,"alpha":2,"mid":{"b":1,"a":2}}"#).unwrap();

        assert_eq!(canonicalize(&body), r#"{"zeta":1,"alpha":2,"mid":{"b":1,"a":2}}"#);
    }

    #[test]
    fn test_escapes_apply_to_keys() {
        let body = json!({"<k>": 1});

        assert_eq!(canonicalize(&body), "{\"\\u003ck\\u003e\":1}");
    }

    #[test]
    fn test_input_not_mutated() {
        let body = json!({"a": "<b>"});
        let before = body.clone();
        let _ = canonicalize(&body);

        assert_eq!(body, before);
    }

    #[test]
    fn test_canonical_bytes_from_struct() {
        #[derive(Serialize)]
        struct Delivery<'a> {
            id: u64,
            event: &'a str,
        }

        let bytes = canonical_bytes(&Delivery { id: 1, event: "Tom & Jerry" }).unwrap();

        assert_eq!(bytes, b"{\"id\":1,\"event\":\"Tom \\u0026 Jerry\"}".to_vec());
    }

    #[test]
    fn test_canonical_bytes_rejects_non_string_keys() {
        let mut body = std::collections::HashMap::new();
        body.insert(vec![1u8], "value");

        assert!(canonical_bytes(&body).is_err());
    }
}
