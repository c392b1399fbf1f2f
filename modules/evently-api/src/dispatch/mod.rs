//! Request dispatcher: routes a normalized request to one operation, runs it
//! against the injected event store, and always produces a JSON response.

pub mod error;
pub mod events;
pub mod request;
pub mod response;
pub mod validation;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use evently_store::EventStore;
use futures::FutureExt;
use serde_json::json;
use tracing::{error, info, info_span, warn, Instrument};

pub use error::ApiError;
pub use request::{ApiRequest, RequestBody};
pub use response::ApiResponse;

const EVENTS_PATH: &str = "/events";
const EVENT_ITEM_PREFIX: &str = "/events/";

/// Operation selected by the routing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Preflight,
    Banner,
    Health,
    ListEvents,
    CreateEvent,
    /// The path remainder after `/events/`, not yet validated as an id.
    GetEvent(&'a str),
    UpdateEvent(&'a str),
    DeleteEvent(&'a str),
    NotFound,
}

/// First match wins. `method` must already be upper-cased.
pub fn route<'a>(method: &str, path: &'a str) -> Route<'a> {
    if method == "OPTIONS" {
        return Route::Preflight;
    }
    match (method, path) {
        ("GET", "/") => Route::Banner,
        ("GET", "/health") => Route::Health,
        ("GET", EVENTS_PATH) => Route::ListEvents,
        ("POST", EVENTS_PATH) => Route::CreateEvent,
        _ => match (method, path.strip_prefix(EVENT_ITEM_PREFIX)) {
            ("GET", Some(rest)) => Route::GetEvent(rest),
            ("PUT", Some(rest)) => Route::UpdateEvent(rest),
            ("DELETE", Some(rest)) => Route::DeleteEvent(rest),
            _ => Route::NotFound,
        },
    }
}

/// Stateless apart from the store handle; clone freely across requests.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn EventStore>,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Handle one request. Never fails: store errors and panics inside an
    /// operation become 500 responses.
    pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
        let span = info_span!(
            "api_request",
            method = %request.method,
            path = %request.path,
        );

        async move {
            let outcome = AssertUnwindSafe(self.dispatch(request))
                .catch_unwind()
                .await;

            let response = match outcome {
                Ok(Ok(response)) => response,
                Ok(Err(err)) => {
                    if err.status().is_server_error() {
                        error!(error = %err, "Request failed");
                    } else {
                        warn!(status = err.status().as_u16(), error = %err, "Request rejected");
                    }
                    err.into_response()
                }
                Err(_) => {
                    error!("Request handler panicked");
                    ApiError::Internal("Internal server error".to_string()).into_response()
                }
            };

            info!(status = response.status.as_u16(), "Request handled");
            response
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let ApiRequest {
            method,
            path,
            body,
            query,
        } = request;
        let store = self.store.as_ref();

        match route(&method, &path) {
            Route::Preflight => Ok(ApiResponse::message("OK")),
            Route::Banner => Ok(ApiResponse::message("Event Management API")),
            Route::Health => Ok(ApiResponse::ok(json!({ "status": "healthy" }))),
            Route::ListEvents => events::list_events(store, &query).await,
            Route::CreateEvent => events::create_event(store, body).await,
            Route::GetEvent(rest) => events::get_event(store, rest).await,
            Route::UpdateEvent(rest) => events::update_event(store, rest, body).await,
            Route::DeleteEvent(rest) => events::delete_event(store, rest).await,
            Route::NotFound => Err(ApiError::NotFound("Not found".to_string())),
        }
    }
}
