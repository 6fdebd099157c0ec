//! Canonical JSON (§4.8): keys sorted lexicographically at every level, no
//! insignificant whitespace, shortest IEEE-754 float round-trip —
//! `serde_json`'s own number formatting already gives us that, so this
//! module only has to enforce key order; source strings are read as UTF-8
//! and passed through as already-normalized. Content hashing follows the
//! pack's `Sha256::new()` / `hasher.finalize()` / `format!("{:x}", ...)`
//! pattern used elsewhere for content fingerprinting.

use serde_json::Value as Json;
use sha2::{Digest, Sha256};

/// Render any JSON value as compact, key-sorted text.
pub fn to_canonical_string(value: &Json) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Json, out: &mut String) {
    match value {
        Json::Null => out.push_str("null"),
        Json::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Json::Number(n) => out.push_str(&n.to_string()),
        Json::String(s) => write_json_string(s, out),
        Json::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Json::Object(map) => {
            out.push('{');
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json_string(key, out);
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
    }
}

fn write_json_string(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// `"sha256:" + hex(sha256(bytes))`.
pub fn content_hash(canonical_json: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json.as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_object_keys_at_every_level() {
        let value = json!({"b": 1, "a": {"z": 2, "y": 3}});
        assert_eq!(to_canonical_string(&value), r#"{"a":{"y":3,"z":2},"b":1}"#);
    }

    #[test]
    fn identical_inputs_hash_identically() {
        let a = to_canonical_string(&json!({"x": 1, "y": 2}));
        let b = to_canonical_string(&json!({"y": 2, "x": 1}));
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn hash_is_sha256_prefixed() {
        let hash = content_hash(&to_canonical_string(&json!({})));
        assert!(hash.starts_with("sha256:"));
        assert_eq!(hash.len(), "sha256:".len() + 64);
    }
}
