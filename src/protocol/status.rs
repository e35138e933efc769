use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::{
    buf::{PutBuf, TryBuf},
    error, protocol,
};

use super::{impl_packet_for, impl_request_id, RequestId};

/// Result codes carried by a status reply
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
pub enum StatusCode {
    #[error("Ok")]
    Ok = 0,
    #[error("Eof")]
    Eof = 1,
    #[error("No such file")]
    NoSuchFile = 2,
    #[error("Failure")]
    Failure = 4,
    #[error("Bad message")]
    BadMessage = 5,
    #[error("Connection lost")]
    ConnectionLost = 7,
    #[error("Operation unsupported")]
    OpUnsupported = 8,
    #[error("Unknown operation id")]
    UnknownOpid = 9,
    #[error("Operation id already in use")]
    OpidInUse = 10,
    #[error("Resource exhausted")]
    ResourceExhausted = 11,
}

impl From<u32> for StatusCode {
    fn from(value: u32) -> Self {
        num_traits::FromPrimitive::from_u32(value).unwrap_or(Self::Failure)
    }
}

/// Status reply. Answers every request that has no payload of its own
/// and carries every remote failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub id: u32,
    pub status_code: StatusCode,
    pub error_message: String,
    pub language_tag: String,
}

impl Status {
    pub fn new(id: u32, status_code: StatusCode, msg: &str) -> Self {
        Self {
            id,
            status_code,
            error_message: msg.to_owned(),
            language_tag: "en-US".to_owned(),
        }
    }

    pub fn ok(id: u32) -> Self {
        Self::new(id, StatusCode::Ok, "")
    }

    pub fn error(id: u32, status_code: StatusCode) -> Self {
        Self::new(id, status_code, &status_code.to_string())
    }
}

impl_request_id!(Status);
impl_packet_for!(Status, protocol::Response);

impl From<Status> for Bytes {
    fn from(status: Status) -> Self {
        let mut bytes = BytesMut::new();

        bytes.put_u32(status.id);
        bytes.put_u32(status.status_code as u32);
        bytes.put_str(&status.error_message);
        bytes.put_str(&status.language_tag);

        bytes.freeze()
    }
}

impl TryFrom<&mut Bytes> for Status {
    type Error = error::Error;

    fn try_from(bytes: &mut Bytes) -> Result<Self, Self::Error> {
        Ok(Self {
            id: bytes.try_get_u32()?,
            status_code: StatusCode::from(bytes.try_get_u32()?),
            error_message: bytes.try_get_string()?,
            language_tag: bytes.try_get_string()?,
        })
    }
}
