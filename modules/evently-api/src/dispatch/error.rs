use axum::http::StatusCode;
use evently_store::StoreError;
use thiserror::Error;

use super::response::ApiResponse;

pub const EVENT_NOT_FOUND: &str = "Event not found";

#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed input. Always a 400.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Failed to {op} event: {source}")]
    Store {
        op: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn event_not_found() -> Self {
        Self::NotFound(EVENT_NOT_FOUND.to_string())
    }

    /// Wrap a store failure for `map_err`, naming the operation that failed.
    pub fn store(op: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Store { op, source }
    }

    /// A record deleted between the existence check and a conditional write
    /// is reported the same way as one that never existed.
    fn is_lost_record(&self) -> bool {
        matches!(
            self,
            Self::Store {
                source: StoreError::ConditionFailed(_),
                ..
            }
        )
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            _ if self.is_lost_record() => StatusCode::NOT_FOUND,
            Self::Store { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the client. Database and migration errors are
    /// reduced to their category; `Display` keeps the full cause for logs.
    pub fn client_message(&self) -> String {
        match self {
            Self::Store {
                op,
                source: StoreError::Database(_) | StoreError::Migrate(_),
            } => format!("Failed to {op} event: Database error"),
            _ => self.to_string(),
        }
    }

    pub fn into_response(self) -> ApiResponse {
        if self.is_lost_record() {
            return ApiResponse::error(StatusCode::NOT_FOUND, EVENT_NOT_FOUND);
        }
        ApiResponse::error(self.status(), self.client_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validation_maps_to_400() {
        let response = ApiError::validation("No fields to update").into_response();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body, json!({"error": "No fields to update"}));
    }

    #[test]
    fn store_failure_names_the_operation() {
        let err = ApiError::store("create")(StoreError::Unavailable("disk full".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let response = err.into_response();
        assert_eq!(
            response.body,
            json!({"error": "Failed to create event: Store unavailable: disk full"})
        );
    }

    #[test]
    fn failed_condition_maps_to_not_found() {
        let err = ApiError::store("update")(StoreError::ConditionFailed("e1".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        let response = err.into_response();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body, json!({"error": "Event not found"}));
    }

    #[test]
    fn database_errors_are_not_echoed_to_clients() {
        let err = ApiError::store("list")(StoreError::Database(sqlx::Error::Protocol(
            "relation \"events\" violates constraint \"events_pkey\"".into(),
        )));
        assert!(err.to_string().contains("events_pkey"));

        let response = err.into_response();
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.body,
            json!({"error": "Failed to list event: Database error"})
        );
    }
}
