use crate::transaction::EntityType;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("no plugin is registered for entity type {0}")]
    UnknownEntityType(EntityType),

    #[error("transaction is not supported at top level")]
    UnsupportedTopLevel(EntityType),
}
