//! Registry Error Types
//!
//! Defines error values returned by table, subscriber, and storage
//! operations. Errors are plain values returned to the caller; nothing in
//! this crate retries internally.

use thiserror::Error;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur during registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Requested event or subscription has not been created
    #[error("event not found")]
    EventNotFound,

    /// Requested subscriber does not exist
    #[error("subscriber not found")]
    SubscriberNotFound,

    /// An event or subscription with this name already exists
    #[error("event already exists")]
    EventExists,

    /// State file could not be read or written
    #[error("{operation}: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// State data could not be encoded or decoded
    #[error("{operation}: {source}")]
    Format {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl RegistryError {
    /// Wrap an I/O error with the operation that failed
    pub fn io(operation: &'static str, source: std::io::Error) -> Self {
        Self::Io { operation, source }
    }

    /// Wrap a codec error with the operation that failed
    pub fn format(operation: &'static str, source: serde_json::Error) -> Self {
        Self::Format { operation, source }
    }
}
