//! Canonical JSON form used to fingerprint authorization configs.
//!
//! Object keys are sorted, no insignificant whitespace is emitted and strings
//! are escaped the same way every time, so two configs with the same grants
//! hash identically regardless of source formatting.

use crate::error::{AuthzError, Result};
use serde_json::Value;
use std::io::Write;

/// Canonicalizes a JSON value to a deterministic string representation.
pub fn canonicalize(value: &Value) -> Result<String> {
    let mut output = Vec::new();
    write_canonical(&mut output, value)?;
    String::from_utf8(output).map_err(|e| AuthzError::CanonicalizationError(e.to_string()))
}

/// Computes the canonical hash of a JSON value.
pub fn canonical_hash(value: &Value) -> Result<String> {
    let canonical = canonicalize(value)?;
    Ok(crate::hash::sha256_str(&canonical))
}

fn write_canonical<W: Write>(writer: &mut W, value: &Value) -> Result<()> {
    match value {
        Value::Null => writer.write_all(b"null").map_err(io_error)?,
        Value::Bool(true) => writer.write_all(b"true").map_err(io_error)?,
        Value::Bool(false) => writer.write_all(b"false").map_err(io_error)?,
        Value::Number(n) => write!(writer, "{}", n).map_err(io_error)?,
        Value::String(s) => write_escaped_string(writer, s)?,
        Value::Array(arr) => {
            writer.write_all(b"[").map_err(io_error)?;
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    writer.write_all(b",").map_err(io_error)?;
                }
                write_canonical(writer, item)?;
            }
            writer.write_all(b"]").map_err(io_error)?;
        }
        Value::Object(obj) => {
            writer.write_all(b"{").map_err(io_error)?;
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();

            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    writer.write_all(b",").map_err(io_error)?;
                }
                write_escaped_string(writer, key)?;
                writer.write_all(b":").map_err(io_error)?;
                write_canonical(writer, &obj[key.as_str()])?;
            }
            writer.write_all(b"}").map_err(io_error)?;
        }
    }
    Ok(())
}

fn write_escaped_string<W: Write>(writer: &mut W, s: &str) -> Result<()> {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    writer.write_all(out.as_bytes()).map_err(io_error)
}

fn io_error(err: std::io::Error) -> AuthzError {
    AuthzError::CanonicalizationError(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonicalize_primitives() {
        assert_eq!(canonicalize(&json!(null)).unwrap(), "null");
        assert_eq!(canonicalize(&json!(true)).unwrap(), "true");
        assert_eq!(canonicalize(&json!(42)).unwrap(), "42");
        assert_eq!(canonicalize(&json!("hello")).unwrap(), "\"hello\"");
    }

    #[test]
    fn test_grant_keys_sorted() {
        let grant = json!({"scopes": ["own"], "role": "member", "actions": ["read"], "resource": "tasks"});
        assert_eq!(
            canonicalize(&grant).unwrap(),
            r#"{"actions":["read"],"resource":"tasks","role":"member","scopes":["own"]}"#
        );
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(
            canonicalize(&json!("line\n\"quoted\"")).unwrap(),
            r#""line\n\"quoted\"""#
        );
    }

    #[test]
    fn test_hash_ignores_key_order() {
        let a = json!({"version": "1", "grants": []});
        let b = json!({"grants": [], "version": "1"});
        assert_eq!(canonical_hash(&a).unwrap(), canonical_hash(&b).unwrap());
    }
}
