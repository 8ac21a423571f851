use thiserror::Error;

/// Domain failures shared by every tutor crate.
///
/// Out-of-scope questions are deliberately absent: a failed relevance gate is
/// a successful retrieval outcome, not an error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),

    #[error("No content found for selected topics.")]
    EmptyCandidates,

    #[error("Malformed generation output: {0}")]
    MalformedGenerationOutput(String),

    #[error("Generation service failed: {0}")]
    Collaborator(String),
}

pub type Result<T> = std::result::Result<T, Error>;
