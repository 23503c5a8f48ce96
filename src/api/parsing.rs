use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::percent_decode_str;
use serde_json::Value;
use tracing::debug;

use crate::context::OpContext;
use crate::core::models::SaveTextRequest;
use crate::errors::ApiError;
use crate::telemetry::{Baggage, SpanContext};

pub fn v_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = root;
    for key in path {
        cur = cur.get(*key)?;
    }
    Some(cur)
}

pub fn v_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    v_path(root, path).and_then(|v| v.as_str())
}

pub fn get_header_value<'a>(headers: &'a Value, name: &str) -> Option<&'a str> {
    if let Some(v) = headers.get(name).and_then(|s| s.as_str()) {
        return Some(v);
    }
    headers.as_object().and_then(|map| {
        map.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                v.as_str()
            } else {
                None
            }
        })
    })
}

/// HTTP method of an API Gateway event (payload v2, falling back to v1).
#[must_use]
pub fn request_method(payload: &Value) -> String {
    v_str(payload, &["requestContext", "http", "method"])
        .or_else(|| v_str(payload, &["httpMethod"]))
        .unwrap_or("GET")
        .to_ascii_uppercase()
}

#[must_use]
pub fn request_path(payload: &Value) -> &str {
    v_str(payload, &["rawPath"])
        .or_else(|| v_str(payload, &["path"]))
        .unwrap_or("/")
}

/// Decodes one percent-encoded path segment.
#[must_use]
pub fn decode_path_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

/// Returns the request body, base64-decoding it when the gateway says so.
pub fn extract_body(payload: &Value) -> Result<String, ApiError> {
    let Some(body) = payload.get("body").and_then(Value::as_str) else {
        return Err(ApiError::MissingBody);
    };

    let encoded = payload
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !encoded {
        return Ok(body.to_string());
    }

    let bytes = STANDARD
        .decode(body)
        .map_err(|e| ApiError::InvalidBody(format!("base64: {e}")))?;
    String::from_utf8(bytes).map_err(|e| ApiError::InvalidBody(format!("utf-8: {e}")))
}

pub fn parse_text_body(payload: &Value) -> Result<SaveTextRequest, ApiError> {
    let body = extract_body(payload)?;
    if body.trim().is_empty() {
        return Err(ApiError::MissingBody);
    }
    Ok(serde_json::from_str(&body)?)
}

/// Builds the context a request runs under: remote parent from `traceparent`
/// and entries from `baggage`, when present and well formed.
#[must_use]
pub fn request_context(payload: &Value) -> OpContext {
    let mut ctx = OpContext::background();
    let Some(headers) = payload.get("headers") else {
        return ctx;
    };

    if let Some(header) = get_header_value(headers, "traceparent") {
        match SpanContext::from_traceparent(header) {
            Some(remote) => ctx = ctx.with_span(remote),
            None => debug!(traceparent = %header, "Ignoring malformed traceparent header"),
        }
    }

    if let Some(header) = get_header_value(headers, "baggage") {
        ctx = ctx.with_baggage(Baggage::from_header(header));
    }

    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let headers = json!({ "TraceParent": "abc", "x": "y" });
        assert_eq!(get_header_value(&headers, "traceparent"), Some("abc"));
        assert_eq!(get_header_value(&headers, "missing"), None);
    }

    #[test]
    fn test_method_and_path_from_v2_and_v1_payloads() {
        let v2 = json!({ "rawPath": "/save-text", "requestContext": { "http": { "method": "post" } } });
        assert_eq!(request_method(&v2), "POST");
        assert_eq!(request_path(&v2), "/save-text");

        let v1 = json!({ "path": "/texts/1", "httpMethod": "DELETE" });
        assert_eq!(request_method(&v1), "DELETE");
        assert_eq!(request_path(&v1), "/texts/1");
    }

    #[test]
    fn test_base64_body_is_decoded() {
        let payload = json!({ "body": "eyJ0ZXh0IjoiaGkifQ==", "isBase64Encoded": true });
        let request = parse_text_body(&payload).unwrap();
        assert_eq!(request.text, "hi");
    }

    #[test]
    fn test_malformed_bodies_are_rejected() {
        assert!(matches!(
            parse_text_body(&json!({})),
            Err(ApiError::MissingBody)
        ));
        assert!(matches!(
            parse_text_body(&json!({ "body": "" })),
            Err(ApiError::MissingBody)
        ));
        assert!(matches!(
            parse_text_body(&json!({ "body": "{\"txt\": 1}" })),
            Err(ApiError::InvalidBody(_))
        ));
        assert!(matches!(
            parse_text_body(&json!({ "body": "%%%", "isBase64Encoded": true })),
            Err(ApiError::InvalidBody(_))
        ));
    }

    #[test]
    fn test_request_context_reads_trace_headers() {
        let payload = json!({
            "headers": {
                "traceparent": "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
                "baggage": "session=42"
            }
        });
        let ctx = request_context(&payload);
        let remote = ctx.span().unwrap();
        assert!(remote.remote);
        assert_eq!(remote.span_id.to_hex(), "00f067aa0ba902b7");
        assert_eq!(ctx.baggage().get("session"), Some("42"));
    }

    #[test]
    fn test_request_context_ignores_bad_traceparent() {
        let payload = json!({ "headers": { "traceparent": "nope" } });
        assert!(request_context(&payload).span().is_none());
        assert!(request_context(&json!({})).span().is_none());
    }
}
