//! HTTP ingress. Every request, whatever its method or path, goes through a
//! single fallback handler into the dispatcher, which owns routing.

use std::collections::HashMap;
use std::fmt::Display;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{Method, Request, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::dispatch::{ApiError, ApiRequest, ApiResponse, Dispatcher, RequestBody};

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let body = self.body_string();
        let mut response = (self.status, body).into_response();
        response.headers_mut().extend(self.headers);
        response
    }
}

pub fn router(dispatcher: Dispatcher) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(dispatcher)
        // Logging layer: method + path only (no query string, no body)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}

async fn dispatch(
    State(dispatcher): State<Dispatcher>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    match into_request(&method, &uri, body) {
        Ok(request) => dispatcher.handle(request).await.into_response(),
        Err(err) => {
            warn!(status = err.status().as_u16(), error = %err, "Request rejected at ingress");
            let response: ApiResponse = err.into_response();
            response.into_response()
        }
    }
}

/// Decode the transport request. Path segments are percent-decoded so that
/// `/events/spring%20fair` addresses the event stored as `spring fair`.
fn into_request(method: &Method, uri: &Uri, body: Bytes) -> Result<ApiRequest, ApiError> {
    let path = urlencoding::decode(uri.path()).map_err(|_| ApiError::validation("Invalid path"))?;

    let mut request = ApiRequest::new(method.as_str(), path.into_owned());
    request.query = query_params(Query::try_from_uri(uri))?;
    if !body.is_empty() {
        request.body = Some(RequestBody::from_bytes(body.to_vec())?);
    }
    Ok(request)
}

fn query_params<E: Display>(
    parsed: Result<Query<HashMap<String, String>>, E>,
) -> Result<HashMap<String, String>, ApiError> {
    match parsed {
        Ok(Query(params)) => Ok(params),
        Err(rejection) => {
            warn!(error = %rejection, "Unparseable query string");
            Err(ApiError::validation("Invalid query string"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(raw: &str) -> Uri {
        raw.parse().unwrap()
    }

    #[test]
    fn path_is_percent_decoded() {
        let request = into_request(&Method::GET, &uri("/events/spring%20fair"), Bytes::new()).unwrap();
        assert_eq!(request.path, "/events/spring fair");
    }

    #[test]
    fn encoded_slash_becomes_a_separator() {
        let request = into_request(&Method::GET, &uri("/events/a%2Fb"), Bytes::new()).unwrap();
        assert_eq!(request.path, "/events/a/b");
    }

    #[test]
    fn path_that_decodes_to_invalid_utf8_is_rejected() {
        let err = into_request(&Method::GET, &uri("/events/%FF"), Bytes::new()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid path");
    }

    #[test]
    fn query_is_collected() {
        let request =
            into_request(&Method::GET, &uri("/events?status=active"), Bytes::new()).unwrap();
        assert_eq!(request.query["status"], "active");
    }

    #[test]
    fn query_rejection_is_a_bad_request() {
        let err = query_params(Err("expected `=`")).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid query string");
    }

    #[test]
    fn non_utf8_body_is_rejected() {
        let body = Bytes::from_static(b"{\"title\":\"caf\xe9\"}");
        let err = into_request(&Method::POST, &uri("/events"), body).unwrap_err();
        assert_eq!(err.to_string(), "Request body must be valid UTF-8");
    }
}
