//! Error types for facility operations.

use thiserror::Error;

/// Errors produced by the post office primitives and driver.
#[derive(Debug, Error)]
pub enum OfficeError {
    /// An internal contract breach, such as a worker slot reused before its
    /// previous handshake completed. Always a programming defect.
    #[error("protocol violation on slot {slot}: {detail}")]
    ProtocolViolation {
        /// Worker slot the breach was detected on.
        slot: usize,
        /// What went wrong.
        detail: String,
    },
    /// A semaphore was released past its permit limit.
    #[error("semaphore released beyond its limit of {max} permits")]
    PermitOverflow {
        /// Maximum permits the semaphore may hold.
        max: usize,
    },
    /// A blocking wait was abandoned because of cancellation.
    #[error("wait interrupted by shutdown")]
    Interrupted,
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A customer or worker thread panicked.
    #[error("{role} thread {id} panicked")]
    ThreadPanicked {
        /// `"customer"`, `"worker"` or `"driver"`.
        role: &'static str,
        /// Customer or worker id.
        id: usize,
    },
    /// The OS refused to spawn a thread.
    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl OfficeError {
    /// Build a [`OfficeError::ProtocolViolation`] for `slot`.
    pub fn violation(slot: usize, detail: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            slot,
            detail: detail.into(),
        }
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
