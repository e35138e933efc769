use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::{
    buf::{PutBuf, TryBuf},
    error, protocol,
};

use super::{impl_packet_for, impl_request_id, RequestId};

/// Entry of the favorites registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub name: String,
    pub private: bool,
}

impl FavoriteEntry {
    pub fn new<T: Into<String>>(name: T, private: bool) -> Self {
        Self {
            name: name.into(),
            private,
        }
    }
}

/// Reply to a favorites request
#[derive(Debug, PartialEq, Eq)]
pub struct Favorites {
    pub id: u32,
    pub folders: Vec<FavoriteEntry>,
}

impl_request_id!(Favorites);
impl_packet_for!(Favorites, protocol::Response);

impl From<Favorites> for Bytes {
    #[allow(clippy::cast_possible_truncation)]
    fn from(favorites: Favorites) -> Self {
        let mut bytes = BytesMut::new();
        bytes.put_u32(favorites.id);
        bytes.put_u32(favorites.folders.len() as u32);

        for folder in &favorites.folders {
            bytes.put_str(&folder.name);
            bytes.put_bool(folder.private);
        }

        bytes.freeze()
    }
}

impl TryFrom<&mut Bytes> for Favorites {
    type Error = error::Error;

    fn try_from(bytes: &mut Bytes) -> Result<Self, Self::Error> {
        let id = bytes.try_get_u32()?;
        let count = bytes.try_get_u32()?;

        let mut folders = Vec::new();
        for _ in 0..count {
            folders.push(FavoriteEntry {
                name: bytes.try_get_string()?,
                private: bytes.try_get_bool()?,
            });
        }

        Ok(Self { id, folders })
    }
}
