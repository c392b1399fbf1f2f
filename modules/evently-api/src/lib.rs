pub mod dispatch;
pub mod ingress;

use std::sync::Arc;

use anyhow::{Context, Result};
use evently_common::StoreBackend;
use evently_store::{EventStore, MemoryEventStore, PgEventStore};

pub use dispatch::{ApiError, ApiRequest, ApiResponse, Dispatcher, RequestBody};

/// Open the configured event store.
pub async fn connect_store(backend: &StoreBackend) -> Result<Arc<dyn EventStore>> {
    match backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryEventStore::new())),
        StoreBackend::Postgres {
            database_url,
            max_connections,
        } => {
            let store = PgEventStore::connect(database_url, *max_connections)
                .await
                .context("Failed to open postgres event store")?;
            Ok(Arc::new(store))
        }
    }
}
