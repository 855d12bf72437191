//! Error types for confsync.
//!
//! Errors surface only during client construction. Once a
//! [`ConfClient`](crate::core::ConfClient) is running, remote and mirror failures
//! are absorbed internally: lookups fall back to cached or default values and
//! the daemon retries with backoff, so no steady-state operation returns an
//! error to the caller.

/// Result type alias for confsync operations.
pub type Result<T> = std::result::Result<T, ConfError>;

/// Errors that can occur when working with the configuration client.
#[derive(Debug, thiserror::Error)]
pub enum ConfError {
    /// The remote admin source could not be reached or returned a failure.
    ///
    /// Internal to the sync engine: callers of `get` never see this variant,
    /// it is converted into negative-cache or backoff behavior.
    #[error("remote admin source unavailable: {0}")]
    RemoteUnavailable(String),

    /// The admin source answered, but with a payload the client cannot use.
    #[error("unexpected admin response: {0}")]
    RemoteProtocol(String),

    /// Failed to persist the mirror snapshot.
    #[error("mirror write failed: {0}")]
    MirrorWrite(#[from] std::io::Error),

    /// Client was constructed with invalid settings.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Shutdown did not complete within the bounded wait.
    #[error("daemon did not stop within {0:?}")]
    ShutdownTimeout(std::time::Duration),
}
