use thiserror::Error;

/// Directory-specific error types for the Rollcall kiosk.
///
/// A failed lookup is never fatal to a kiosk session: the resolver turns any
/// of these into a transient `LookupFailed` outcome.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The directory backend could not be reached
    #[error("Directory unavailable: {0}")]
    Unavailable(String),

    /// A seed record could not be turned into a directory entry
    #[error("Invalid seed record #{index}: {reason}")]
    InvalidSeed { index: usize, reason: String },

    /// The same token appears twice in a seed
    #[error("Duplicate token in seed: {0}")]
    DuplicateToken(String),

    /// Seed file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Seed file is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DirectoryError {
    /// Create an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    /// Check whether retrying the same lookup later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Specialized result type for directory operations
pub type DirectoryResult<T> = Result<T, DirectoryError>;
