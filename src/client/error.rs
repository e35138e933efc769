use std::io;
use thiserror::Error;
use tokio::sync::mpsc::error::SendError as MpscSendError;
use tokio::time::error::Elapsed as TimeElapsed;

use crate::error;
use crate::protocol::{Status, StatusCode};

/// Enum for session errors
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Contains an error status packet
    #[error("{}: {}", .0.status_code, .0.error_message)]
    Status(Status),
    /// Any errors related to I/O
    #[error("I/O: {0}")]
    IO(String),
    /// Time limit for receiving response packet exceeded
    #[error("Timeout")]
    Timeout,
    /// Occurs when an unexpected packet is sent
    #[error("Unexpected packet")]
    UnexpectedPacket,
    /// Occurs when the remote side does not behave as the protocol requires
    #[error("{0}")]
    UnexpectedBehavior(String),
}

impl Error {
    /// Status code of the remote reply, if this error carries one
    pub const fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Status(status) => Some(status.status_code),
            _ => None,
        }
    }
}

impl From<Status> for Error {
    fn from(status: Status) -> Self {
        Self::Status(status)
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self::IO(error.to_string())
    }
}

impl<T> From<MpscSendError<T>> for Error {
    fn from(err: MpscSendError<T>) -> Self {
        Self::UnexpectedBehavior(format!("SendError: {err}"))
    }
}

impl From<TimeElapsed> for Error {
    fn from(_: TimeElapsed) -> Self {
        Self::Timeout
    }
}

impl From<error::Error> for Error {
    fn from(error: error::Error) -> Self {
        Self::UnexpectedBehavior(error.to_string())
    }
}

/// Failures of one listing invocation. Every variant except [`ListError::NoPaths`]
/// names the path it aborted
#[derive(Debug, Error)]
pub enum ListError {
    #[error("ls requires at least one path argument")]
    NoPaths,
    #[error("{0}: not a remote path")]
    InvalidPathType(String),
    #[error("{0}: no matches")]
    NoMatch(String),
    #[error("{0}: invalid pattern")]
    InvalidPattern(String),
    #[error("{path}: could not allocate an operation: {source}")]
    ResourceExhausted { path: String, source: Error },
    #[error("{path}: could not submit listing: {source}")]
    SubmitFailed { path: String, source: Error },
    #[error("{path}: listing failed: {source}")]
    JobFailed { path: String, source: Error },
    #[error("{path}: favorites lookup failed: {source}")]
    Favorites { path: String, source: Error },
    #[error("{path}: deadline exceeded")]
    Timeout { path: String },
    #[error("{path}: cancelled")]
    Cancelled { path: String },
}

impl ListError {
    /// Path the failure belongs to
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::NoPaths => None,
            Self::InvalidPathType(path) | Self::NoMatch(path) | Self::InvalidPattern(path) => {
                Some(path)
            }
            Self::ResourceExhausted { path, .. }
            | Self::SubmitFailed { path, .. }
            | Self::JobFailed { path, .. }
            | Self::Favorites { path, .. }
            | Self::Timeout { path }
            | Self::Cancelled { path } => Some(path),
        }
    }
}
