//! Catalog error model.

use thiserror::Error;

/// Result type used by the catalog domain.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Deterministic failures raised by the catalog, cart and document layers.
///
/// Infrastructure failures (sockets, files) are reported through
/// `anyhow::Error` by the callers that own them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// A value was rejected at the boundary (negative price, zero quantity, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The item is not present in the catalog.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// A reservation asks for more units than the catalog holds.
    #[error("insufficient stock for {name}: requested {requested}, available {available}")]
    InsufficientStock {
        /// Item name.
        name: String,
        /// Units requested in total.
        requested: u64,
        /// Units currently in stock.
        available: u64,
    },

    /// A catalog document could not be parsed.
    #[error("invalid catalog document: {0}")]
    Document(String),
}

impl CatalogError {
    /// Build a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build an unknown-item error.
    pub fn unknown_item(name: impl Into<String>) -> Self {
        Self::UnknownItem(name.into())
    }

    /// Build a document error.
    pub fn document(msg: impl Into<String>) -> Self {
        Self::Document(msg.into())
    }
}
