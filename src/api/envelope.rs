//! The `{status, message, errors, data}` wrapper used by every `/v1` response.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// A validation failure attached to a request field (e.g. `trades[1].price`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: ResponseStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<FieldError>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            errors: Vec::new(),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            errors,
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_shape() {
        let json = serde_json::to_value(Envelope::success("ok", 5)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "success", "message": "ok", "errors": [], "data": 5})
        );
    }

    #[test]
    fn test_error_shape() {
        let envelope: Envelope<()> =
            Envelope::error("Invalid request", vec![FieldError::new("risk_amount", "Required")]);
        let json = serde_json::to_value(envelope).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["errors"][0]["field"], "risk_amount");
        assert!(json["data"].is_null());
    }

    #[test]
    fn test_deserialize_without_optional_fields() {
        let envelope: Envelope<u32> =
            serde_json::from_str(r#"{"status": "success", "data": 3}"#).unwrap();
        assert_eq!(envelope.data, Some(3));
        assert!(envelope.errors.is_empty());
    }
}
