//! JSON envelopes and error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fragments::{ErrorKind, FragmentError};
use serde_json::{json, Map, Value};

/// Wrap `fields` in `{"status": "ok", ...}`.
pub fn ok(fields: Value) -> Json<Value> {
    let mut body = Map::new();
    body.insert("status".to_string(), Value::from("ok"));
    if let Value::Object(fields) = fields {
        body.extend(fields);
    }
    Json(Value::Object(body))
}

/// An error response: `{"status": "error", "error": {"code", "message"}}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized")
    }

    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, message)
    }
}

impl From<FragmentError> for ApiError {
    fn from(err: FragmentError) -> Self {
        let status = match err.kind() {
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::UnsupportedType | ErrorKind::UnsupportedConversion => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ErrorKind::StoreFailure => {
                tracing::error!(error = ?err, "fragment store failure");
                return Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error");
            }
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "status": "error",
            "error": {
                "code": self.status.as_u16(),
                "message": self.message,
            }
        });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_merges_fields() {
        let Json(body) = ok(json!({"fragments": ["a", "b"]}));
        assert_eq!(body, json!({"status": "ok", "fragments": ["a", "b"]}));

        let Json(body) = ok(json!({}));
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[test]
    fn test_error_kinds_map_to_status() {
        let not_found = FragmentError::NotFound {
            owner: "o".to_string(),
            id: "x".to_string(),
        };
        assert_eq!(ApiError::from(not_found).status, StatusCode::NOT_FOUND);

        let unsupported = FragmentError::UnsupportedType("application/msword".to_string());
        assert_eq!(
            ApiError::from(unsupported).status,
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );

        let invalid = FragmentError::InvalidArgument("bad".to_string());
        assert_eq!(ApiError::from(invalid).status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_failure_hides_details() {
        let err = FragmentError::Store {
            operation: "put data",
            owner: "secret-owner".to_string(),
            id: "x".to_string(),
            source: fragments::StoreError::ReadOnly,
        };
        let api = ApiError::from(err);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.message.contains("secret-owner"));
    }
}
