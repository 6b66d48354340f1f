/// Export transforms for a finished document: the double-encoded string
/// form merchants paste into API consoles, the payment-ready attachment
/// envelope, and the reverse decoding of pasted serialized strings.
use serde_json::Value;

/// Content type marker of the payment-ready attachment.
pub const EMD_CONTENT_TYPE: &str = "application/vnd.klarna.internal.emd-v2+json";

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("input is empty")]
    Empty,
    #[error("unable to parse the string as JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// JSON-encode the document, then JSON-encode that string. The outer quotes
/// are stripped so the result can be dropped straight into a string field.
pub fn double_encoded(document: &Value) -> String {
    let encoded = Value::String(document.to_string()).to_string();
    encoded[1..encoded.len() - 1].to_string()
}

/// Wrap the document in the payment-ready attachment envelope, with the
/// document itself carried as an encoded string under `attachment.body`.
pub fn payment_ready(document: &Value) -> Value {
    serde_json::json!({
        "attachment": {
            "content_type": EMD_CONTENT_TYPE,
            "body": document.to_string(),
        }
    })
}

/// Recover a document from pasted text: plain JSON, a quoted serialized
/// string, or the double-encoded form without its outer quotes. String
/// layers are peeled until a structured value appears.
pub fn decode_embedded(input: &str) -> Result<Value, DecodeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::Empty);
    }
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return unwrap_nested(value);
    }
    // Escaped payload without its outer quotes: strip any stray quote pair,
    // undo one escaping layer, and parse again.
    let unescaped = unescape_layer(strip_quotes(trimmed));
    let value = serde_json::from_str(&unescaped)?;
    unwrap_nested(value)
}

fn unwrap_nested(mut value: Value) -> Result<Value, DecodeError> {
    while let Value::String(inner) = value {
        value = serde_json::from_str(&inner)?;
    }
    Ok(value)
}

fn strip_quotes(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .or_else(|| text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')))
        .unwrap_or(text)
}

fn unescape_layer(text: &str) -> String {
    text.replace("\\\"", "\"").replace("\\\\", "\\")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_double_encoded_strips_outer_quotes() {
        let document = json!({"voucher": [{"voucher_name": "City tour"}]});
        let encoded = double_encoded(&document);
        assert!(encoded.starts_with("{\\\""));
        assert!(!encoded.starts_with('"'));
    }

    #[test]
    fn test_double_encode_then_decode_round_trips() {
        let document = json!({
            "air_reservation_details": [{"pnr": "VH67899", "passengers": [1, 2]}]
        });
        let decoded = decode_embedded(&double_encoded(&document)).unwrap();
        assert_eq!(decoded, document);
    }

    #[test]
    fn test_decode_plain_json() {
        let decoded = decode_embedded(r#"{"event": []}"#).unwrap();
        assert_eq!(decoded, json!({"event": []}));
    }

    #[test]
    fn test_decode_quoted_serialized_string() {
        let decoded = decode_embedded(r#""{\"event\": [{\"name\": \"gig\"}]}""#).unwrap();
        assert_eq!(decoded, json!({"event": [{"name": "gig"}]}));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_embedded("not json at all").is_err());
        assert!(matches!(decode_embedded("   "), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_payment_ready_envelope() {
        let document = json!({"voucher": [{"voucher_name": "City tour"}]});
        let envelope = payment_ready(&document);
        assert_eq!(envelope["attachment"]["content_type"], json!(EMD_CONTENT_TYPE));
        // The body is the encoded document, recoverable as-is.
        let body = envelope["attachment"]["body"].as_str().unwrap();
        assert_eq!(serde_json::from_str::<Value>(body).unwrap(), document);
    }
}
