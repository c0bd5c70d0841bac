use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("asset code already exists: {0}")]
    DuplicateCode(String),

    #[error("could not allocate a code under {prefix} after {attempts} attempts")]
    AllocationExhausted { prefix: String, attempts: u32 },

    #[error("asset not found: {id}")]
    NotFound { id: Uuid },

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AssetError>;

impl AssetError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Whether the whole read-compute-write cycle may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DuplicateCode(_))
    }
}
