//! Keyspace naming and key encoding
//!
//! Every aggregate stream lives in its own keyspace named
//! `<aggregate_type>_<aggregate_id>`. Both components are escaped before
//! joining (`%` becomes `%25`, `_` becomes `%5F`) so the single unescaped
//! `_` always marks the boundary and two distinct pairs can never produce
//! the same name.

use crate::types::Sequence;

/// Keyspace holding the cross-aggregate commit order
pub const GLOBAL_EVENT_ORDER: &str = "global_event_order";

const SEPARATOR: char = '_';
const POINTER_SEPARATOR: char = ':';

/// Derive the keyspace name for an aggregate stream
pub fn aggregate_keyspace(aggregate_type: &str, aggregate_id: &str) -> String {
    let mut name = String::with_capacity(aggregate_type.len() + aggregate_id.len() + 1);
    escape_into(aggregate_type, &mut name);
    name.push(SEPARATOR);
    escape_into(aggregate_id, &mut name);
    name
}

/// Split a keyspace name back into `(aggregate_type, aggregate_id)`
///
/// Returns `None` for names not produced by [`aggregate_keyspace`].
pub fn parse_aggregate_keyspace(name: &str) -> Option<(String, String)> {
    let (ty, id) = name.split_once(SEPARATOR)?;
    if id.contains(SEPARATOR) {
        return None;
    }
    Some((unescape(ty)?, unescape(id)?))
}

fn escape_into(component: &str, out: &mut String) {
    for c in component.chars() {
        match c {
            '%' => out.push_str("%25"),
            '_' => out.push_str("%5F"),
            c => out.push(c),
        }
    }
}

fn unescape(component: &str) -> Option<String> {
    let mut out = String::with_capacity(component.len());
    let mut rest = component;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let code = rest.get(pos + 1..pos + 3)?;
        match code {
            "25" => out.push('%'),
            "5F" => out.push('_'),
            _ => return None,
        }
        rest = &rest[pos + 3..];
    }
    out.push_str(rest);
    Some(out)
}

/// Format a sequence as big-endian bytes (lexicographic order = numeric order)
pub fn sequence_key(seq: Sequence) -> [u8; 8] {
    seq.to_be_bytes()
}

/// Parse a sequence from big-endian bytes
pub fn key_to_sequence(bytes: &[u8]) -> Option<Sequence> {
    let raw: [u8; 8] = bytes.try_into().ok()?;
    Some(Sequence::from_be_bytes(raw))
}

/// Global log pointer `"<keyspace>:<sequence>"`
pub fn format_pointer(keyspace: &str, seq: Sequence) -> String {
    format!("{}{}{}", keyspace, POINTER_SEPARATOR, seq)
}

/// Parse a global log pointer into `(keyspace, sequence)`
pub fn parse_pointer(raw: &str) -> Option<(&str, Sequence)> {
    let (keyspace, seq) = raw.rsplit_once(POINTER_SEPARATOR)?;
    if keyspace.is_empty() {
        return None;
    }
    Some((keyspace, seq.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names() {
        assert_eq!(aggregate_keyspace("user", "u1"), "user_u1");
        assert_eq!(
            parse_aggregate_keyspace("user_u1"),
            Some(("user".to_string(), "u1".to_string()))
        );
    }

    #[test]
    fn test_separator_in_components_does_not_collide() {
        // Naive concatenation would map both pairs to "a_b_c"
        let left = aggregate_keyspace("a_b", "c");
        let right = aggregate_keyspace("a", "b_c");
        assert_ne!(left, right);
        assert_eq!(left, "a%5Fb_c");
        assert_eq!(right, "a_b%5Fc");

        assert_eq!(
            parse_aggregate_keyspace(&left),
            Some(("a_b".to_string(), "c".to_string()))
        );
        assert_eq!(
            parse_aggregate_keyspace(&right),
            Some(("a".to_string(), "b_c".to_string()))
        );
    }

    #[test]
    fn test_escape_character_in_components() {
        let name = aggregate_keyspace("50%", "%5F");
        assert_eq!(name, "50%25_%255F");
        assert_eq!(
            parse_aggregate_keyspace(&name),
            Some(("50%".to_string(), "%5F".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_foreign_names() {
        assert_eq!(parse_aggregate_keyspace("global"), None);
        assert_eq!(parse_aggregate_keyspace("a_b_c"), None);
        assert_eq!(parse_aggregate_keyspace("a%zz_b"), None);
        assert_eq!(parse_aggregate_keyspace("a%2_b"), None);
    }

    #[test]
    fn test_sequence_sort_order() {
        let a = sequence_key(255);
        let b = sequence_key(256);
        assert!(a < b);
        assert_eq!(key_to_sequence(&b), Some(256));
        assert_eq!(key_to_sequence(&[0, 1]), None);
    }

    #[test]
    fn test_pointer_format() {
        let pointer = format_pointer("user_u1", 7);
        assert_eq!(pointer, "user_u1:7");
        assert_eq!(parse_pointer(&pointer), Some(("user_u1", 7)));

        // Colons inside the keyspace name are left alone
        assert_eq!(parse_pointer("urn:x_u1:3"), Some(("urn:x_u1", 3)));
        assert_eq!(parse_pointer("user_u1"), None);
        assert_eq!(parse_pointer(":4"), None);
        assert_eq!(parse_pointer("user_u1:x"), None);
    }
}
