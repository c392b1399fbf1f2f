use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreResult;
use crate::expression::UpdateExpression;

/// One stored record: a JSON object that always carries a string `eventId`.
pub type Item = serde_json::Map<String, Value>;

/// Single-field equality predicate for scans. Exact and case-sensitive.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanFilter {
    pub field: String,
    pub value: Value,
}

impl ScanFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        item.get(&self.field) == Some(&self.value)
    }
}

/// Key-value store for event records.
///
/// Implemented by `PgEventStore` (postgres) and `MemoryEventStore` (default
/// backend and tests). Also implemented for `Arc<S>` so a store can be shared
/// with test assertions.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Unconditional upsert keyed by the item's `eventId`.
    async fn put(&self, item: Item) -> StoreResult<()>;

    async fn get(&self, event_id: &str) -> StoreResult<Option<Item>>;

    /// Full read. Order is store-defined.
    async fn scan(&self, filter: Option<&ScanFilter>) -> StoreResult<Vec<Item>>;

    /// Apply `expression` to an existing record and return the record as it
    /// is after the update. Fails with `ConditionFailed` if the key is absent.
    async fn update(&self, event_id: &str, expression: &UpdateExpression) -> StoreResult<Item>;

    /// Remove by key. Deleting an absent key is not an error.
    async fn delete(&self, event_id: &str) -> StoreResult<()>;
}

#[async_trait]
impl<S: EventStore + ?Sized> EventStore for Arc<S> {
    async fn put(&self, item: Item) -> StoreResult<()> {
        (**self).put(item).await
    }

    async fn get(&self, event_id: &str) -> StoreResult<Option<Item>> {
        (**self).get(event_id).await
    }

    async fn scan(&self, filter: Option<&ScanFilter>) -> StoreResult<Vec<Item>> {
        (**self).scan(filter).await
    }

    async fn update(&self, event_id: &str, expression: &UpdateExpression) -> StoreResult<Item> {
        (**self).update(event_id, expression).await
    }

    async fn delete(&self, event_id: &str) -> StoreResult<()> {
        (**self).delete(event_id).await
    }
}
