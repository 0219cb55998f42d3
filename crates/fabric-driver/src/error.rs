//! Error types for fabric driver operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fabric operations
pub type Result<T> = std::result::Result<T, FabricError>;

/// Errors that can occur during fabric operations
#[derive(Debug, Error)]
pub enum FabricError {
    /// Device not found at the expected path
    #[error("Device not found: {path}")]
    DeviceNotFound {
        /// Path that was checked
        path: PathBuf,
    },

    /// Transport-level fault on the register link
    ///
    /// Fatal by design: the core never retries a dead link.
    #[error("Transport fault: {reason}")]
    Transport {
        /// Reason for failure
        reason: String,
    },

    /// I/O error during device communication
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// A bounded blocking operation exhausted its poll budget
    ///
    /// An unbounded stall never surfaces as an error; this variant only
    /// exists when the caller supplied a bounded [`crate::RetryPolicy`].
    #[error("Channel stalled (valid wire {valid:#04x}) after {polls} polls")]
    Stalled {
        /// Valid-wire address of the stalled channel
        valid: u32,
        /// Number of polls issued before giving up
        polls: u64,
    },
}

impl FabricError {
    /// Create a device not found error
    pub fn device_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DeviceNotFound { path: path.into() }
    }

    /// Create a transport fault error
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }
}
