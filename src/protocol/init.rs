use bytes::{BufMut, Bytes, BytesMut};

use crate::{buf::TryBuf, error, protocol};

use super::{impl_packet_for, VERSION};

/// Handshake request. The only packet sent without a request id
#[derive(Debug, PartialEq, Eq)]
pub struct Init {
    pub version: u32,
}

impl_packet_for!(Init, protocol::Request);

impl Init {
    pub const fn new() -> Self {
        Self { version: VERSION }
    }
}

impl Default for Init {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Init> for Bytes {
    fn from(init: Init) -> Self {
        let mut bytes = BytesMut::new();
        bytes.put_u32(init.version);
        bytes.freeze()
    }
}

impl TryFrom<&mut Bytes> for Init {
    type Error = error::Error;

    fn try_from(bytes: &mut Bytes) -> Result<Self, Self::Error> {
        Ok(Self {
            version: bytes.try_get_u32()?,
        })
    }
}
