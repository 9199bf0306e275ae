//! Error types for model and query operations.
//!
//! [`StoreError`] is what an [`IblockStore`](crate::store::IblockStore) reports;
//! [`ModelError`] wraps it together with the failures this layer raises itself.

use crate::value::Id;
use thiserror::Error;

/// Failure reported by the underlying content store.
///
/// Store errors are propagated unchanged; this layer never retries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Transport or storage level failure
    #[error("Store backend error: {0}")]
    Backend(String),
    /// The store refused the operation
    #[error("Store rejected {operation}: {message}")]
    Rejected {
        operation: &'static str,
        message: String,
    },
    /// Other store errors
    #[error("Store error: {0}")]
    Other(String),
}

/// Error type for element and section models and their queries
#[derive(Debug, Error)]
pub enum ModelError {
    /// The store call itself failed
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A model kind is missing a binding it needs (programming error)
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// A bound model's record no longer exists in the store
    #[error("Record {0} not found")]
    NotFound(Id),
    /// The operation needs a store record but the model has no id
    #[error("Model is not bound to a store record")]
    MissingId,
    /// A row lacks the field the result collection is keyed by
    #[error("Key field `{0}` is missing on a fetched item")]
    MissingKey(String),
    /// The store answered with a shape the call convention does not allow
    #[error("Unexpected store result: {0}")]
    UnexpectedResult(String),
}

impl ModelError {
    /// Whether this error signals a programming mistake rather than a data or store failure
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, ModelError::Configuration(_))
    }
}
