use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::export::TransportError;
use crate::models::ModelError;

/// Errors surfaced by the registry and the review workflow.
///
/// `TypeTag::Unknown` is a valid classification and never shows up here.
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Document not found: {0}")]
    NotFound(Uuid),

    #[error("Document id already present: {0}")]
    DuplicateId(Uuid),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Columns {found:?} do not match the table schema {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Export failed: {0}")]
    ExportFailed(#[source] TransportError),

    #[error("Document recognition failed: {0}")]
    IngestFailed(String),

    #[error("Document recognition timed out after {0:?}")]
    IngestTimedOut(Duration),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal lock poisoned")]
    LockPoisoned,
}

impl From<ModelError> for ReviewError {
    fn from(err: ModelError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
