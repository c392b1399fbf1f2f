//! Key-value event store keyed by `eventId`.
//!
//! Records are opaque JSON objects. The store knows the key attribute and
//! nothing else about the event schema; validation belongs to the caller.

pub mod error;
pub mod expression;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use expression::{UpdateExpression, UpdateExpressionBuilder};
pub use memory::MemoryEventStore;
pub use postgres::PgEventStore;
pub use traits::{EventStore, Item, ScanFilter};
