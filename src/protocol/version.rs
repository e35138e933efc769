use bytes::{BufMut, Bytes, BytesMut};

use crate::{buf::TryBuf, error, protocol};

use super::impl_packet_for;

/// Handshake reply
#[derive(Debug, PartialEq, Eq)]
pub struct Version {
    pub version: u32,
}

impl Version {
    pub const fn new() -> Self {
        Self {
            version: protocol::VERSION,
        }
    }
}

impl_packet_for!(Version, protocol::Response);

impl Default for Version {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Version> for Bytes {
    fn from(version: Version) -> Self {
        let mut bytes = BytesMut::new();
        bytes.put_u32(version.version);
        bytes.freeze()
    }
}

impl TryFrom<&mut Bytes> for Version {
    type Error = error::Error;

    fn try_from(bytes: &mut Bytes) -> Result<Self, Self::Error> {
        Ok(Self {
            version: bytes.try_get_u32()?,
        })
    }
}
