//! PgEventStore: single-table event store backed by Postgres.
//!
//! Each record is one JSONB document in `events.item`, keyed by
//! `events.event_id`. Partial updates are JSONB merges guarded by the key's
//! existence, so a record deleted between a caller's existence check and its
//! update surfaces as `ConditionFailed` rather than being recreated.

use async_trait::async_trait;
use evently_common::EVENT_ID;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::expression::UpdateExpression;
use crate::traits::{EventStore, Item, ScanFilter};

#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool and run the embedded migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        info!(max_connections, "Connected to postgres event store");
        Ok(store)
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn put(&self, item: Item) -> StoreResult<()> {
        let event_id = item
            .get(EVENT_ID)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or(StoreError::MissingKey(EVENT_ID))?;

        sqlx::query(
            r#"
            INSERT INTO events (event_id, item)
            VALUES ($1, $2)
            ON CONFLICT (event_id) DO UPDATE SET item = EXCLUDED.item
            "#,
        )
        .bind(&event_id)
        .bind(Json(&item))
        .execute(&self.pool)
        .await?;

        debug!(event_id = %event_id, "put");
        Ok(())
    }

    async fn get(&self, event_id: &str) -> StoreResult<Option<Item>> {
        let row = sqlx::query_scalar::<_, Json<Item>>("SELECT item FROM events WHERE event_id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|Json(item)| item))
    }

    async fn scan(&self, filter: Option<&ScanFilter>) -> StoreResult<Vec<Item>> {
        let rows = match filter {
            Some(filter) => {
                sqlx::query_scalar::<_, Json<Item>>("SELECT item FROM events WHERE item -> $1 = $2")
                    .bind(&filter.field)
                    .bind(Json(&filter.value))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar::<_, Json<Item>>("SELECT item FROM events")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.into_iter().map(|Json(item)| item).collect())
    }

    async fn update(&self, event_id: &str, expression: &UpdateExpression) -> StoreResult<Item> {
        if expression.is_empty() {
            return Err(StoreError::EmptyUpdate);
        }
        if expression.touches(EVENT_ID) {
            return Err(StoreError::KeyAttributeUpdate(EVENT_ID.to_string()));
        }

        let patch = expression.to_patch();
        let row = sqlx::query_scalar::<_, Json<Item>>(
            r#"
            UPDATE events
            SET item = item || $2
            WHERE event_id = $1
            RETURNING item
            "#,
        )
        .bind(event_id)
        .bind(Json(&patch))
        .fetch_optional(&self.pool)
        .await?;

        debug!(event_id = %event_id, fields = expression.len(), "update");
        row.map(|Json(item)| item)
            .ok_or_else(|| StoreError::ConditionFailed(event_id.to_string()))
    }

    async fn delete(&self, event_id: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM events WHERE event_id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        debug!(event_id = %event_id, "delete");
        Ok(())
    }
}
