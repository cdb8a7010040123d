use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StorePulseError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog item not found: {0}")]
    ItemNotFound(Uuid),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
