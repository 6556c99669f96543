//! Caller-facing errors
//!
//! A governance `abort` is not an error: it is a normal outcome reported
//! through the governors' return values.

use thiserror::Error;

use crate::backend::BackendError;

#[derive(Debug, Error)]
pub enum GovernError {
    /// Malformed or empty request. Nothing was generated or governed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The generation backend failed
    #[error("generation failed: {0}")]
    Backend(#[from] BackendError),

    /// The caller went away before the exchange finished
    #[error("exchange cancelled")]
    Cancelled,
}

pub type GovernResult<T> = Result<T, GovernError>;
