use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    buf::{PutBuf, TryBuf},
    error,
};

use super::{impl_request_id, OpId, RequestId};

/// Submits a listing job under an already allocated operation id.
/// Whether the walk is recursive is decided by the packet type
#[derive(Debug, PartialEq, Eq)]
pub struct List {
    pub id: u32,
    pub opid: OpId,
    pub path: String,
}

impl_request_id!(List);

impl From<List> for Bytes {
    fn from(list: List) -> Self {
        let mut bytes = BytesMut::new();
        bytes.put_u32(list.id);
        bytes.put_slice(list.opid.as_bytes());
        bytes.put_str(&list.path);
        bytes.freeze()
    }
}

impl TryFrom<&mut Bytes> for List {
    type Error = error::Error;

    fn try_from(bytes: &mut Bytes) -> Result<Self, Self::Error> {
        Ok(Self {
            id: bytes.try_get_u32()?,
            opid: OpId::new(bytes.try_get_array()?),
            path: bytes.try_get_string()?,
        })
    }
}
