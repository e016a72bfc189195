//! Error types for the relay domain.
//!
//! [`RelayError`] covers a status-mapping table the relay cannot interpret.
//! [`TrackerError`] is produced by implementations of [`crate::EntityTracker`];
//! it carries only strings so the domain crate stays free of transport types.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Relay-level errors
// ---------------------------------------------------------------------------

/// Errors that prevent the relay from operating.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The status-mapping table could not be interpreted.
    #[error("Invalid status mapping: {message}")]
    InvalidMapping {
        /// Description of the offending entry.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Remote tracker errors
// ---------------------------------------------------------------------------

/// Failures reported by the remote entity-tracking service or the transport
/// in front of it.
///
/// Handlers never retry; a failed read is treated as "not found" and a failed
/// write as "no update happened".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// The request never produced an HTTP response (DNS, TLS, timeout, ...).
    #[error("Transport error: {message}")]
    Transport {
        /// Underlying transport error text.
        message: String,
    },

    /// The service rejected the script credentials or the bearer token.
    #[error("Authentication with the tracking service failed: {message}")]
    Authentication {
        /// Error text returned by the service.
        message: String,
    },

    /// The service answered with a non-success status.
    #[error("Tracking service returned {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Response body or error summary.
        message: String,
    },

    /// A response body could not be decoded into an entity record.
    #[error("Could not decode tracking service response: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },
}
