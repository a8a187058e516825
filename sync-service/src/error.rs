//! Error types for sync-service.

/// Main error type for sync-service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The listener could not bind its address.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// Configured bind address.
        address: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A listener is already active; stop it before starting another.
    #[error("already listening")]
    AlreadyListening,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

