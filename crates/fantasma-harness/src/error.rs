//! Harness error types.

use std::time::Duration;

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Terminal outcome of a failed exchange.
///
/// At most one of these survives a run; whichever stage fails first wins,
/// except that a timeout that won the arbiter race overrides late arrivals.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The connection-producing task could not establish a connection.
    #[error("connection setup failed: {0}")]
    Setup(std::io::Error),

    /// The serving loop reported an error unrelated to expected shutdown.
    #[error("serve loop failed: {0}")]
    Serve(#[from] hyper::Error),

    /// The run did not complete within the configured bound.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// Tearing the serving loop down failed.
    #[error("shutdown error: {0}")]
    Shutdown(String),

    /// I/O error outside the setup stage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Creates a shutdown error.
    #[must_use]
    pub fn shutdown(msg: impl Into<String>) -> Self {
        Self::Shutdown(msg.into())
    }

    /// Returns true if the run was cut short by the deadline.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Returns true if the connection never got established.
    #[must_use]
    pub const fn is_setup(&self) -> bool {
        matches!(self, Self::Setup(_))
    }
}
