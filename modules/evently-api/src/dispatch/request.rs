use std::collections::HashMap;

use evently_common::normalize_numbers;
use evently_store::Item;
use serde_json::Value;

use super::error::ApiError;

/// Request body as delivered by an ingress: raw text still to be parsed, or
/// an object some ingress already decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Text(String),
    Json(Value),
}

impl RequestBody {
    /// Raw body bytes from a transport. Bytes that are not UTF-8 are
    /// rejected rather than repaired.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ApiError> {
        String::from_utf8(bytes)
            .map(Self::Text)
            .map_err(|_| ApiError::validation("Request body must be valid UTF-8"))
    }

    /// Blank text and JSON `null` count as no body at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Json(value) => value.is_null(),
        }
    }

    /// Decode into a JSON object with whole numbers normalized to integers.
    pub fn into_object(self) -> Result<Item, ApiError> {
        let value = match self {
            Self::Text(text) => serde_json::from_str(&text)
                .map_err(|_| ApiError::validation("Request body must be valid JSON"))?,
            Self::Json(value) => value,
        };
        match normalize_numbers(value) {
            Value::Object(map) => Ok(map),
            _ => Err(ApiError::validation("Request body must be a JSON object")),
        }
    }
}

/// Normalized inbound request, independent of any transport.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Upper-cased HTTP method.
    pub method: String,
    pub path: String,
    pub body: Option<RequestBody>,
    pub query: HashMap<String, String>,
}

impl ApiRequest {
    pub fn new(method: &str, path: impl Into<String>) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            path: path.into(),
            body: None,
            query: HashMap::new(),
        }
    }

    pub fn with_text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }
}

/// Returns the body unless it is absent or empty.
pub fn require_body(body: Option<RequestBody>) -> Result<RequestBody, ApiError> {
    body.filter(|b| !b.is_empty())
        .ok_or_else(|| ApiError::validation("Request body is required"))
}
