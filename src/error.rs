use std::io;
use thiserror::Error;

use crate::protocol::StatusCode;

/// Errors raised while framing or decoding packets
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O: {0}")]
    IO(String),
    #[error("{0}")]
    Protocol(#[from] StatusCode),
    #[error("Unexpected EOF on stream")]
    UnexpectedEof,
    #[error("Bad message: {0}")]
    BadMessage(String),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Self::UnexpectedEof,
            kind => Self::IO(kind.to_string()),
        }
    }
}

impl From<Error> for StatusCode {
    fn from(err: Error) -> Self {
        match err {
            Error::Protocol(status_code) => status_code,
            Error::BadMessage(_) => Self::BadMessage,
            Error::UnexpectedEof => Self::ConnectionLost,
            Error::IO(_) => Self::Failure,
        }
    }
}
