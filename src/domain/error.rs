//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the hierarchy rules.
///
/// Identifiers are carried as their display form so the error type does not
/// depend on the entity's id type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("duplicate identifier: {0}")]
    DuplicateId(String),

    #[error("dangling parent reference: {id} -> {parent}")]
    DanglingParentReference { id: String, parent: String },

    #[error("cyclic parent reference at: {0}")]
    CyclicReference(String),

    #[error("invalid record at position {position}: {message}")]
    InvalidRecord { position: usize, message: String },

    #[error("not an entity reference: {0}")]
    NotAnEntityRef(String),

    #[error("hierarchy too deep to nest: depth {depth} exceeds {limit}")]
    NestingTooDeep { depth: usize, limit: usize },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
