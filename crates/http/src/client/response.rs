//! Response body decoding

use serde_json::Value as JsonValue;

/// Statuses that never carry a body
pub(crate) fn is_bodiless(status: u16) -> bool {
    matches!(status, 204 | 205)
}

/// Decode a response body
///
/// Empty bodies become `null`. Anything else that is not valid JSON,
/// whitespace included, is kept verbatim as a JSON string.
pub fn parse_body(text: &str) -> JsonValue {
    if text.is_empty() {
        return JsonValue::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| JsonValue::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(""), JsonValue::Null);
        assert_eq!(parse_body("  \n"), json!("  \n"));
        assert_eq!(parse_body(r#"{"id": 3}"#), json!({"id": 3}));
        assert_eq!(
            parse_body("<html>Bad Gateway</html>"),
            json!("<html>Bad Gateway</html>")
        );
    }

    #[test]
    fn test_bodiless_statuses() {
        assert!(is_bodiless(204));
        assert!(is_bodiless(205));
        assert!(!is_bodiless(200));
    }
}
