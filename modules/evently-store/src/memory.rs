//! In-memory event store. Default backend when no database is configured,
//! and the store every dispatcher test runs against.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use evently_common::EVENT_ID;
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::expression::UpdateExpression;
use crate::traits::{EventStore, Item, ScanFilter};

#[derive(Default)]
pub struct MemoryEventStore {
    items: RwLock<HashMap<String, Item>>,
    fail_writes: AtomicBool,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write (`put`, `update`, `delete`) fail with `Unavailable`.
    pub fn failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::Relaxed);
        self
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

fn key_of(item: &Item) -> StoreResult<String> {
    item.get(EVENT_ID)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or(StoreError::MissingKey(EVENT_ID))
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn put(&self, item: Item) -> StoreResult<()> {
        self.check_writable()?;
        let key = key_of(&item)?;
        self.items.write().await.insert(key, item);
        Ok(())
    }

    async fn get(&self, event_id: &str) -> StoreResult<Option<Item>> {
        Ok(self.items.read().await.get(event_id).cloned())
    }

    async fn scan(&self, filter: Option<&ScanFilter>) -> StoreResult<Vec<Item>> {
        let items = self.items.read().await;
        Ok(items
            .values()
            .filter(|item| filter.map_or(true, |f| f.matches(item)))
            .cloned()
            .collect())
    }

    async fn update(&self, event_id: &str, expression: &UpdateExpression) -> StoreResult<Item> {
        self.check_writable()?;
        if expression.is_empty() {
            return Err(StoreError::EmptyUpdate);
        }
        if expression.touches(EVENT_ID) {
            return Err(StoreError::KeyAttributeUpdate(EVENT_ID.to_string()));
        }
        let mut items = self.items.write().await;
        let item = items
            .get_mut(event_id)
            .ok_or_else(|| StoreError::ConditionFailed(event_id.to_string()))?;
        expression.apply(item);
        Ok(item.clone())
    }

    async fn delete(&self, event_id: &str) -> StoreResult<()> {
        self.check_writable()?;
        self.items.write().await.remove(event_id);
        Ok(())
    }
}
