//! The JSON request/response envelope exchanged with proxies and mixers
//! (spec.md §6.1). Framing onto raw sockets is [`ov_json::JsonParser`]'s
//! job; this module only knows about the decoded shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ErrorCode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub event: String,
    pub uuid: Uuid,
    #[serde(default)]
    pub parameter: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub event: String,
    pub uuid: Uuid,
    #[serde(default)]
    pub response: Value,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<ErrorDetail>,
}

impl Response {
    pub fn error_code(&self) -> ErrorCode {
        self.error.as_ref().map_or(ErrorCode::NoError, |e| e.code)
    }
}

/// An inbound message is a [`Request`] if it carries a `parameter`
/// field and no `response`/`error`, a [`Response`] otherwise. Gateways
/// and mixers never send anything else over this envelope.
pub enum Inbound {
    Request(Request),
    Response(Response),
}

pub fn classify(value: Value) -> Option<Inbound> {
    if value.get("response").is_some() || value.get("error").is_some() {
        serde_json::from_value(value).ok().map(Inbound::Response)
    } else {
        serde_json::from_value(value).ok().map(Inbound::Request)
    }
}

pub fn request(event: impl Into<String>, uuid: Uuid, parameter: Value) -> Value {
    serde_json::to_value(Request {
        event: event.into(),
        uuid,
        parameter,
    })
    .expect("Request always serializes")
}

pub fn success(event: impl Into<String>, uuid: Uuid, response: Value) -> Value {
    serde_json::to_value(Response {
        event: event.into(),
        uuid,
        response,
        error: None,
    })
    .expect("Response always serializes")
}

pub fn failure(event: impl Into<String>, uuid: Uuid, code: ErrorCode, description: impl Into<String>) -> Value {
    serde_json::to_value(Response {
        event: event.into(),
        uuid,
        response: Value::Null,
        error: Some(ErrorDetail {
            code,
            description: description.into(),
        }),
    })
    .expect("Response always serializes")
}
