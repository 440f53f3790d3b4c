//! Error types shared by the todo service crates.
//!
//! # Design
//! `ValidationError` carries the index of the offending record so logs can
//! point at it, while its `Display` text is the client-facing message.
//! `StoreErrorKind` is the closed vocabulary every storage engine's
//! classifier maps driver errors into; handlers only ever branch on it.

use thiserror::Error;

/// Why a submitted batch was rejected before touching the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("todos array is required and cannot be empty")]
    EmptyBatch,

    #[error("title is required for each todo")]
    MissingTitle { index: usize },

    #[error("id is required for updates")]
    MissingId { index: usize },

    #[error("due_date must be RFC3339")]
    InvalidDueDate { index: usize, value: String },
}

impl ValidationError {
    /// Position of the offending record in the batch, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            ValidationError::EmptyBatch => None,
            ValidationError::MissingTitle { index }
            | ValidationError::MissingId { index }
            | ValidationError::InvalidDueDate { index, .. } => Some(*index),
        }
    }
}

/// Semantic category of a persistence failure, independent of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// A uniqueness constraint rejected the write.
    Conflict,

    /// The addressed row does not exist.
    NotFound,

    /// The store could not be reached or the pool gave up; may succeed later.
    Transient,

    /// Anything else.
    Fatal,
}
