use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// A conditional write found no record under the key.
    #[error("The conditional request failed: no event with id {0}")]
    ConditionFailed(String),

    #[error("Cannot update attribute {0}. This attribute is part of the key")]
    KeyAttributeUpdate(String),

    #[error("Item is missing a string key attribute {0}")]
    MissingKey(&'static str),

    #[error("Update expression must set at least one attribute")]
    EmptyUpdate,

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
