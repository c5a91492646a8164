//! Discovery Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Client failures are raised as
//! [`ErrorKind::BackendUnavailable`] with the client's own error kept as a
//! child frame.

use derive_more::{Display, Error};

/// A discovery error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No usable search criteria were supplied.
    #[display("invalid argument: {_0}")]
    InvalidArgument(#[error(not(source))] String),
    /// The backend cannot search by the requested criterion. Never returned
    /// from a discovery call; logged and turned into an empty result.
    #[display("{backend} does not support {capability} searches")]
    UnsupportedCapability {
        backend: &'static str,
        capability: &'static str,
    },
    /// A backend call failed outright. The core never retries.
    #[display("backend unavailable: {_0}")]
    BackendUnavailable(#[error(not(source))] String),
    /// A backend record could not be turned into a file descriptor. Never
    /// returned from a discovery call; logged and the record is dropped.
    #[display("unable to normalize backend record: {_0}")]
    NormalizationFailure(#[error(not(source))] String),
    /// The operation exists on the contract but no backend implements it.
    #[display("not implemented: {_0}")]
    NotImplemented(#[error(not(source))] &'static str),
    /// Backend scope rejected at construction time.
    #[display("invalid configuration: {_0}")]
    InvalidConfig(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_))
    }

    pub(crate) fn backend(message: impl Into<String>) -> Self {
        Self::BackendUnavailable(message.into())
    }
}
