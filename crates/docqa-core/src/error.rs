use thiserror::Error;

/// Failure taxonomy for one pipeline run.
///
/// Every variant aborts the run and reaches the caller; nothing here
/// is retried inside the pipeline. Collaborator calls never mutate
/// the index, so an outer retry layer stays idempotent-safe.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Index store unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Classification unavailable: {0}")]
    ClassificationUnavailable(String),

    #[error("Answer synthesis unavailable: {0}")]
    SynthesisUnavailable(String),

    #[error("Invalid vector weight {0}: must be within [0, 1]")]
    InvalidWeight(f32),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Run cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
