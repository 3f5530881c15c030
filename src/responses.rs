//! Uniform success envelope
//!
//! Every successful response renders as
//! `{ body, status_code, additional_information }`, the mirror image of the
//! error envelope in [`crate::error`]. Handlers attach extras (tokens,
//! pagination metadata) through [`Envelope::with_info`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};

/// Success response wrapper
#[derive(Debug)]
pub struct Envelope<T> {
    status: StatusCode,
    body: T,
    info: Map<String, Value>,
}

impl<T: Serialize> Envelope<T> {
    /// 200 OK envelope
    pub fn ok(body: T) -> Self {
        Self::with_status(StatusCode::OK, body)
    }

    /// 201 Created envelope
    pub fn created(body: T) -> Self {
        Self::with_status(StatusCode::CREATED, body)
    }

    fn with_status(status: StatusCode, body: T) -> Self {
        Self {
            status,
            body,
            info: Map::new(),
        }
    }

    /// Attach a key to `additional_information`
    #[must_use]
    pub fn with_info(mut self, key: &str, value: impl Serialize) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| Error::Internal(format!("Failed to serialize response info: {e}")))?;
        self.info.insert(key.to_string(), value);
        Ok(self)
    }

    /// Render the envelope body as JSON
    pub fn to_value(&self) -> Result<Value> {
        let body = serde_json::to_value(&self.body)
            .map_err(|e| Error::Internal(format!("Failed to serialize response body: {e}")))?;
        Ok(json!({
            "body": body,
            "status_code": self.status.as_u16(),
            "additional_information": self.info,
        }))
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        match self.to_value() {
            Ok(value) => (self.status, Json(value)).into_response(),
            Err(e) => e.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope_shape() {
        let envelope = Envelope::ok(json!({"name": "Whiskers"}));
        let value = envelope.to_value().unwrap();
        assert_eq!(value["status_code"], 200);
        assert_eq!(value["body"]["name"], "Whiskers");
        assert!(value["additional_information"]
            .as_object()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_created_status() {
        let envelope = Envelope::created(json!({}));
        let response = envelope.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_with_info_accumulates() {
        let envelope = Envelope::ok(json!({}))
            .with_info("access_token", "abc")
            .unwrap()
            .with_info("refresh_token", "def")
            .unwrap();
        let value = envelope.to_value().unwrap();
        assert_eq!(value["additional_information"]["access_token"], "abc");
        assert_eq!(value["additional_information"]["refresh_token"], "def");
    }

    #[test]
    fn test_body_can_be_a_list() {
        let envelope = Envelope::ok(vec![1, 2, 3]);
        let value = envelope.to_value().unwrap();
        assert_eq!(value["body"], json!([1, 2, 3]));
    }
}
