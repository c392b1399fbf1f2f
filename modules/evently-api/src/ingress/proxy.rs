//! Gateway proxy-event ingress.
//!
//! Function runtimes behind an API gateway receive each request as one JSON
//! envelope. Two envelope formats are accepted:
//! - v1: `httpMethod`, `path`, `queryStringParameters`
//! - v2: `requestContext.http.method`, `rawPath`, `queryStringParameters`
//!
//! The body may be a string (optionally base64-encoded), an already-decoded
//! object, or absent.

use std::collections::{BTreeMap, HashMap};

use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::dispatch::{ApiError, ApiRequest, ApiResponse, Dispatcher, RequestBody};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEvent {
    http_method: Option<String>,
    path: Option<String>,
    raw_path: Option<String>,
    request_context: Option<RequestContext>,
    query_string_parameters: Option<HashMap<String, String>>,
    body: Option<Value>,
    #[serde(default)]
    is_base64_encoded: bool,
}

#[derive(Debug, Default, Deserialize)]
struct RequestContext {
    http: Option<HttpContext>,
}

#[derive(Debug, Default, Deserialize)]
struct HttpContext {
    method: Option<String>,
}

impl ProxyEvent {
    pub fn into_request(self) -> Result<ApiRequest, ApiError> {
        let method = self
            .http_method
            .or_else(|| self.request_context.and_then(|ctx| ctx.http?.method))
            .unwrap_or_else(|| "GET".to_string());
        // v1 `path` arrives decoded; v2 `rawPath` is still percent-encoded.
        let path = match (self.path, self.raw_path) {
            (Some(path), _) => path,
            (None, Some(raw)) => urlencoding::decode(&raw)
                .map_err(|_| ApiError::validation("Invalid path"))?
                .into_owned(),
            (None, None) => "/".to_string(),
        };

        let mut request = ApiRequest::new(&method, path);
        request.query = self.query_string_parameters.unwrap_or_default();
        request.body = match self.body {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) if self.is_base64_encoded => {
                let bytes = STANDARD
                    .decode(text.trim())
                    .map_err(|_| ApiError::validation("Request body is not valid base64"))?;
                Some(RequestBody::from_bytes(bytes)?)
            }
            Some(Value::String(text)) => Some(RequestBody::Text(text)),
            Some(decoded) => Some(RequestBody::Json(decoded)),
        };
        Ok(request)
    }
}

/// Response envelope handed back to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    /// JSON-encoded response body.
    pub body: String,
}

impl From<ApiResponse> for ProxyResponse {
    fn from(response: ApiResponse) -> Self {
        let headers = response
            .headers
            .iter()
            .filter_map(|(name, value)| {
                Some((name.as_str().to_string(), value.to_str().ok()?.to_string()))
            })
            .collect();
        Self {
            status_code: response.status.as_u16(),
            body: response.body_string(),
            headers,
        }
    }
}

/// Decode one raw proxy event, dispatch it, and build the response envelope.
/// A malformed envelope is answered with a 400 rather than an error.
pub async fn handle_event(dispatcher: &Dispatcher, event: Value) -> ProxyResponse {
    let request = serde_json::from_value::<ProxyEvent>(event)
        .map_err(|e| {
            warn!(error = %e, "Malformed proxy event");
            ApiError::validation("Malformed request event")
        })
        .and_then(ProxyEvent::into_request);

    let response = match request {
        Ok(request) => dispatcher.handle(request).await,
        Err(err) => ApiResponse::error(StatusCode::BAD_REQUEST, err.to_string()),
    };
    response.into()
}
