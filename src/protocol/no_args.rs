use bytes::{BufMut, Bytes, BytesMut};

use crate::{buf::TryBuf, error};

use super::{impl_request_id, RequestId};

/// Body of requests that carry nothing but their id
#[derive(Debug, PartialEq, Eq)]
pub struct NoArgs {
    pub id: u32,
}

impl_request_id!(NoArgs);

impl From<NoArgs> for Bytes {
    fn from(packet: NoArgs) -> Self {
        let mut bytes = BytesMut::new();
        bytes.put_u32(packet.id);
        bytes.freeze()
    }
}

impl TryFrom<&mut Bytes> for NoArgs {
    type Error = error::Error;

    fn try_from(bytes: &mut Bytes) -> Result<Self, Self::Error> {
        Ok(Self {
            id: bytes.try_get_u32()?,
        })
    }
}
