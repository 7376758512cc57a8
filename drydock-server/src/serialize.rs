//! Outcome serialization onto the wire.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use drydock_core::{Outcome, RawResponse};

/// A fully formed wire response: status, content type and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    pub status: StatusCode,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl WireResponse {
    /// A plain-text response.
    #[must_use]
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain".to_owned(),
            body: body.into().into_bytes(),
        }
    }

    fn from_raw(raw: RawResponse) -> Self {
        Self {
            status: StatusCode::from_u16(raw.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            content_type: raw.content_type,
            body: raw.body,
        }
    }
}

impl IntoResponse for WireResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        if let Ok(value) = HeaderValue::from_str(&self.content_type) {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
        response
    }
}

/// Turn an endpoint outcome into a wire response.
///
/// Raw outcomes pass through untouched. An empty value (null, empty
/// string, empty object or array) means the endpoint had nothing to
/// say and becomes a 404; anything else is pretty-printed JSON.
#[must_use]
pub fn serialize(outcome: Outcome) -> WireResponse {
    match outcome {
        Outcome::Raw(raw) => WireResponse::from_raw(raw),
        Outcome::Value(value) => {
            if is_empty_value(&value) {
                return WireResponse::text(StatusCode::NOT_FOUND, "Content not found");
            }
            match serde_json::to_vec_pretty(&value) {
                Ok(body) => WireResponse {
                    status: StatusCode::OK,
                    content_type: "application/json".to_owned(),
                    body,
                },
                Err(error) => WireResponse::text(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("response serialization failed: {error}"),
                ),
            }
        }
    }
}

fn is_empty_value(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Array(a) => a.is_empty(),
        serde_json::Value::Object(o) => o.is_empty(),
        serde_json::Value::Bool(_) | serde_json::Value::Number(_) => false,
    }
}
