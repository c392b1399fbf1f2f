//! Event CRUD operations. Each takes the store and the already-routed parts
//! of the request and returns a response or a typed error.

use std::collections::HashMap;

use evently_common::{EVENT_ID, STATUS};
use evently_store::{EventStore, ScanFilter, UpdateExpression};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::error::ApiError;
use super::request::{require_body, RequestBody};
use super::response::ApiResponse;
use super::validation::{mirror_descriptions, update_set, validate_new_event};

/// The id segment of an item path (`/events/{id}`), which must be a single
/// non-empty segment.
pub fn event_id_from(rest: &str) -> Result<&str, ApiError> {
    if rest.is_empty() || rest.contains('/') {
        return Err(ApiError::validation("Invalid path"));
    }
    Ok(rest)
}

async fn ensure_exists(
    store: &dyn EventStore,
    event_id: &str,
    op: &'static str,
) -> Result<(), ApiError> {
    match store.get(event_id).await.map_err(ApiError::store(op))? {
        Some(_) => Ok(()),
        None => Err(ApiError::event_not_found()),
    }
}

pub async fn list_events(
    store: &dyn EventStore,
    query: &HashMap<String, String>,
) -> Result<ApiResponse, ApiError> {
    let filter = query
        .get(STATUS)
        .map(|status| ScanFilter::eq(STATUS, status.as_str()));
    let events = store
        .scan(filter.as_ref())
        .await
        .map_err(ApiError::store("list"))?;

    info!(
        count = events.len(),
        status = ?filter.as_ref().and_then(|f| f.value.as_str()),
        "Events listed"
    );
    let events: Vec<Value> = events.into_iter().map(Value::Object).collect();
    Ok(ApiResponse::ok(json!({ "events": events })))
}

pub async fn create_event(
    store: &dyn EventStore,
    body: Option<RequestBody>,
) -> Result<ApiResponse, ApiError> {
    let mut event = require_body(body)?.into_object()?;

    if event.get(EVENT_ID).map_or(true, Value::is_null) {
        event.insert(
            EVENT_ID.to_string(),
            Value::String(Uuid::new_v4().to_string()),
        );
    }
    mirror_descriptions(&mut event);
    validate_new_event(&event)?;

    let event_id = event[EVENT_ID].as_str().unwrap_or_default().to_string();
    store
        .put(event.clone())
        .await
        .map_err(ApiError::store("create"))?;

    info!(event_id = %event_id, "Event created");
    Ok(ApiResponse::created(Value::Object(event)))
}

pub async fn get_event(store: &dyn EventStore, rest: &str) -> Result<ApiResponse, ApiError> {
    let event_id = event_id_from(rest)?;
    let event = store
        .get(event_id)
        .await
        .map_err(ApiError::store("get"))?
        .ok_or_else(ApiError::event_not_found)?;
    Ok(ApiResponse::ok(Value::Object(event)))
}

pub async fn update_event(
    store: &dyn EventStore,
    rest: &str,
    body: Option<RequestBody>,
) -> Result<ApiResponse, ApiError> {
    let event_id = event_id_from(rest)?;
    let body = require_body(body)?;
    ensure_exists(store, event_id, "update").await?;

    let fields = update_set(body.into_object()?)?;
    let expression = UpdateExpression::from_fields(&fields);
    let updated = store
        .update(event_id, &expression)
        .await
        .map_err(ApiError::store("update"))?;

    info!(event_id, fields = expression.len(), "Event updated");
    Ok(ApiResponse::ok(Value::Object(updated)))
}

pub async fn delete_event(store: &dyn EventStore, rest: &str) -> Result<ApiResponse, ApiError> {
    let event_id = event_id_from(rest)?;
    ensure_exists(store, event_id, "delete").await?;

    store
        .delete(event_id)
        .await
        .map_err(ApiError::store("delete"))?;

    info!(event_id, "Event deleted");
    Ok(ApiResponse::message("Event deleted successfully"))
}
