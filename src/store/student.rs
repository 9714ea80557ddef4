// Student record type
// An assigned id plus whatever fields the caller sent

use serde::Serialize;
use serde_json::{Map, Value};

/// Caller-supplied fields, kept in submission order
pub type Fields = Map<String, Value>;

/// Reserved field name owned by the store
pub const ID_FIELD: &str = "id";

/// A stored student record
///
/// Serializes as one flat JSON object: `id` first, then the caller's fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Student {
    pub id: u64,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Student {
    /// Build a record, dropping any `id` the caller tried to set
    pub fn new(id: u64, mut fields: Fields) -> Self {
        fields.retain(|key, _| key != ID_FIELD);
        Self { id, fields }
    }
}

/// Resolve a raw path segment to a student id
///
/// The segment is percent-decoded first, so `%31` resolves to 1. Returns
/// `None` for anything that is not an unsigned integer; such a segment can
/// never match a stored record.
pub fn parse_id(segment: &str) -> Option<u64> {
    decode_segment(segment)?.trim().parse().ok()
}

/// Percent-decode one path segment; malformed escapes or non-UTF-8 give `None`
fn decode_segment(segment: &str) -> Option<String> {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            let hex = std::str::from_utf8(hex).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_new_discards_caller_id() {
        let student = Student::new(3, fields(json!({"id": 99, "name": "Alice"})));
        assert_eq!(student.id, 3);
        assert!(student.fields.get("id").is_none());
        assert_eq!(student.fields.get("name"), Some(&json!("Alice")));
    }

    #[test]
    fn test_serializes_flat_with_id_first() {
        let student = Student::new(1, fields(json!({"name": "Alice", "age": 20})));
        let text = serde_json::to_string(&student).unwrap();
        assert_eq!(text, r#"{"id":1,"name":"Alice","age":20}"#);
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("1"), Some(1));
        assert_eq!(parse_id("042"), Some(42));
        assert_eq!(parse_id(" 5 "), Some(5));
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("-1"), None);
        assert_eq!(parse_id("1.5"), None);
        assert_eq!(parse_id(""), None);
    }

    #[test]
    fn test_parse_id_percent_decodes() {
        assert_eq!(parse_id("%31"), Some(1));
        assert_eq!(parse_id("1%32"), Some(12));
        assert_eq!(parse_id("%201%20"), Some(1));
        assert_eq!(parse_id("%3"), None);
        assert_eq!(parse_id("%zz"), None);
        assert_eq!(parse_id("%FF"), None);
    }
}
