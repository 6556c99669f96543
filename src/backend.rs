//! Generation backend seam
//!
//! The governor only needs two capabilities from a text-generation
//! backend: a prompt-in/text-out call and a lazy sequence of fragments.
//! How generation is performed is the backend's business.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;

/// Lazy, finite, non-restartable sequence of generated text fragments.
///
/// The sequence ends either by returning `None` or by yielding
/// `Err(BackendError::EndOfSequence)`; both mean ordinary completion.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, BackendError>> + Send>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// No more data. Ordinary completion, not a failure.
    #[error("end of sequence")]
    EndOfSequence,

    /// Backend could not be reached or refused the call
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Backend accepted the call but generation failed
    #[error("generation error: {0}")]
    Generation(String),
}

impl BackendError {
    pub fn is_end_of_sequence(&self) -> bool {
        matches!(self, BackendError::EndOfSequence)
    }
}

/// Text-generation collaborator
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Model identifier recorded on governance events
    fn model(&self) -> &str;

    /// Generate a complete response
    async fn generate(&self, prompt: &str) -> Result<String, BackendError>;

    /// Start a streaming generation
    async fn stream(&self, prompt: &str) -> Result<FragmentStream, BackendError>;
}
