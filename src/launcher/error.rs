//! Launch error types

use thiserror::Error;

/// Error types for process launching
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("internal error: {0}")]
    Internal(String),
}
