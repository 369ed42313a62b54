//! Error types

mod drop;
mod field;
mod service;

pub use drop::*;
pub use field::*;
pub use service::*;

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Remote service failure.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Record field access failure.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Drag payload failure.
    #[error(transparent)]
    Drop(#[from] DropError),

    /// Local I/O failure (fixture files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
