use thiserror::Error;

#[derive(Error, Debug)]
pub enum HushError {
    #[error("Invalid topic: {0:?}")]
    InvalidTopic(String),
    #[error("Nothing to process")]
    EmptyInput,
    #[error("Language model unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Language model call failed: {0}")]
    ServiceCall(String),
    #[error("Language model call timed out after {0} ms")]
    Timeout(u64),
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),
    #[error("Node is no longer attached to the document")]
    Detached,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HushError {
    /// Errors that leave content visible instead of surfacing to the page.
    pub fn is_fail_open(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable(_)
                | Self::ServiceCall(_)
                | Self::Timeout(_)
                | Self::MalformedResponse(_)
                | Self::Detached
                | Self::EmptyInput
        )
    }
}

pub type Result<T> = std::result::Result<T, HushError>;
