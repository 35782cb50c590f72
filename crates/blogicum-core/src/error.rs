//! Domain and repository errors.

use thiserror::Error;

/// A request for something that is absent, or that the viewer may not see.
/// Both render as "not found".
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{kind} '{key}' not found")]
    NotFound { kind: &'static str, key: String },

    #[error("'{0}' is not a page number")]
    InvalidPage(String),

    #[error("page {page} is past the last page ({last})")]
    PageOutOfRange { page: u64, last: u64 },
}

impl DomainError {
    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }
}

/// Storage failures, as seen by the ports.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The row to update or delete does not exist.
    #[error("row not found")]
    NotFound,

    /// A unique or foreign key rule rejected the write.
    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("database unreachable: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),
}
