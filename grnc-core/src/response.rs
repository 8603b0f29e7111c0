//! # Result Envelope
//!
//! Every JSON result the engine produces wraps its body in an envelope carrying the
//! return code and timing. Two shapes exist across the protocol version tiers:
//!
//! * the legacy positional shape, `[[return_code, start_time, elapsed, message?], body]`
//!   (tiers 1 and 2);
//! * the versioned shape, `{"header": {"return_code": ..., "error": {...}}, "body": ...}`
//!   (tier 3).
//!
//! [`ResponseEnvelope::parse`] accepts both and normalizes them into one view. The
//! client itself returns payloads verbatim; parsing the envelope is the caller's (or
//! the fixture tooling's) choice.
use serde_json::Value;

/// Errors that can occur while parsing a result envelope.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("Result payload is neither a positional nor a versioned envelope")]
    UnrecognizedShape,
    #[error("Envelope header is missing its return code")]
    MissingReturnCode,
}

/// A parsed view over either envelope shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub return_code: i64,
    pub error_message: Option<String>,
    pub start_time: Option<f64>,
    pub elapsed: Option<f64>,
    pub body: Value,
}

impl ResponseEnvelope {
    /// Whether the wrapped command succeeded.
    pub fn is_success(&self) -> bool {
        self.return_code == 0
    }

    /// Parses a raw result payload into an envelope.
    pub fn parse(payload: &Value) -> Result<Self, EnvelopeError> {
        match payload {
            Value::Array(items) => Self::parse_positional(items),
            Value::Object(map) => Self::parse_versioned(map),
            _ => Err(EnvelopeError::UnrecognizedShape),
        }
    }

    fn parse_positional(items: &[Value]) -> Result<Self, EnvelopeError> {
        let header = items
            .first()
            .and_then(Value::as_array)
            .ok_or(EnvelopeError::UnrecognizedShape)?;
        let return_code = header
            .first()
            .and_then(Value::as_i64)
            .ok_or(EnvelopeError::MissingReturnCode)?;
        Ok(Self {
            return_code,
            error_message: header.get(3).and_then(Value::as_str).map(str::to_string),
            start_time: header.get(1).and_then(Value::as_f64),
            elapsed: header.get(2).and_then(Value::as_f64),
            body: items.get(1).cloned().unwrap_or(Value::Null),
        })
    }

    fn parse_versioned(map: &serde_json::Map<String, Value>) -> Result<Self, EnvelopeError> {
        let header = map
            .get("header")
            .and_then(Value::as_object)
            .ok_or(EnvelopeError::UnrecognizedShape)?;
        let return_code = header
            .get("return_code")
            .and_then(Value::as_i64)
            .ok_or(EnvelopeError::MissingReturnCode)?;
        Ok(Self {
            return_code,
            error_message: header
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string),
            start_time: header.get("start_time").and_then(Value::as_f64),
            elapsed: header.get("elapsed_time").and_then(Value::as_f64),
            body: map.get("body").cloned().unwrap_or(Value::Null),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn positional_envelope() {
        let payload = json!([[0, 1337566253.89858, 0.000355], [["Users", 1]]]);
        let envelope = ResponseEnvelope::parse(&payload).unwrap();
        assert!(envelope.is_success());
        assert_eq!(envelope.return_code, 0);
        assert_eq!(envelope.start_time, Some(1337566253.89858));
        assert_eq!(envelope.body, json!([["Users", 1]]));
        assert!(envelope.error_message.is_none());
    }

    #[test]
    fn positional_envelope_with_error() {
        let payload = json!([[-22, 0.0, 0.0, "invalid table name"], []]);
        let envelope = ResponseEnvelope::parse(&payload).unwrap();
        assert!(!envelope.is_success());
        assert_eq!(envelope.return_code, -22);
        assert_eq!(envelope.error_message.as_deref(), Some("invalid table name"));
    }

    #[test]
    fn versioned_envelope() {
        let payload = json!({
            "header": {"return_code": 0, "start_time": 1.0, "elapsed_time": 0.002},
            "body": {"n_hits": 4}
        });
        let envelope = ResponseEnvelope::parse(&payload).unwrap();
        assert!(envelope.is_success());
        assert_eq!(envelope.elapsed, Some(0.002));
        assert_eq!(envelope.body, json!({"n_hits": 4}));
    }

    #[test]
    fn versioned_envelope_with_error() {
        let payload = json!({
            "header": {"return_code": -22, "error": {"message": "no such column"}},
            "body": null
        });
        let envelope = ResponseEnvelope::parse(&payload).unwrap();
        assert_eq!(envelope.error_message.as_deref(), Some("no such column"));
    }

    #[test]
    fn unrecognized_shapes_are_rejected() {
        assert!(matches!(
            ResponseEnvelope::parse(&json!("plain text")),
            Err(EnvelopeError::UnrecognizedShape)
        ));
        assert!(matches!(
            ResponseEnvelope::parse(&json!({"body": 1})),
            Err(EnvelopeError::UnrecognizedShape)
        ));
        assert!(matches!(
            ResponseEnvelope::parse(&json!([["zero"], []])),
            Err(EnvelopeError::MissingReturnCode)
        ));
    }
}
