use bytes::{BufMut, Bytes, BytesMut};

use crate::{buf::TryBuf, error, protocol};

use super::{impl_packet_for, impl_request_id, DirEntry, RequestId};

/// One page of a listing job
#[derive(Debug, PartialEq, Eq)]
pub struct ListResult {
    pub id: u32,
    pub entries: Vec<DirEntry>,
}

impl_request_id!(ListResult);
impl_packet_for!(ListResult, protocol::Response);

impl From<ListResult> for Bytes {
    #[allow(clippy::cast_possible_truncation)]
    fn from(result: ListResult) -> Self {
        let mut bytes = BytesMut::new();
        bytes.put_u32(result.id);
        bytes.put_u32(result.entries.len() as u32);

        for entry in &result.entries {
            entry.put(&mut bytes);
        }

        bytes.freeze()
    }
}

impl TryFrom<&mut Bytes> for ListResult {
    type Error = error::Error;

    fn try_from(bytes: &mut Bytes) -> Result<Self, Self::Error> {
        let id = bytes.try_get_u32()?;
        let count = bytes.try_get_u32()?;

        let entries = (0..count)
            .map(|_| DirEntry::try_from(&mut *bytes))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { id, entries })
    }
}
