use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::{buf::TryBuf, error, protocol};

use super::{impl_packet_for, impl_request_id, RequestId};

/// Opaque token naming one outstanding job on the remote side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpId([u8; OpId::LEN]);

impl OpId {
    pub const LEN: usize = 16;

    pub const fn new(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }
}

impl From<u128> for OpId {
    fn from(value: u128) -> Self {
        Self(value.to_be_bytes())
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{b:02x}"))
    }
}

/// Carries an operation id. Sent back for an allocation request and used
/// as the body of wait, read and close requests
#[derive(Debug, PartialEq, Eq)]
pub struct Opid {
    pub id: u32,
    pub opid: OpId,
}

impl_request_id!(Opid);
impl_packet_for!(Opid, protocol::Response);

impl From<Opid> for Bytes {
    fn from(opid: Opid) -> Self {
        let mut bytes = BytesMut::new();
        bytes.put_u32(opid.id);
        bytes.put_slice(opid.opid.as_bytes());
        bytes.freeze()
    }
}

impl TryFrom<&mut Bytes> for Opid {
    type Error = error::Error;

    fn try_from(bytes: &mut Bytes) -> Result<Self, Self::Error> {
        Ok(Self {
            id: bytes.try_get_u32()?,
            opid: OpId(bytes.try_get_array()?),
        })
    }
}
