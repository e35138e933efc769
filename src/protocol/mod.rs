mod dirent;
mod favorites;
mod init;
mod list;
mod list_result;
mod no_args;
mod opid;
mod status;
mod version;

use bytes::{BufMut, Bytes, BytesMut};

use crate::{buf::TryBuf, error::Error};

pub use self::{
    dirent::{DirEntry, DirentKind},
    favorites::{FavoriteEntry, Favorites},
    init::Init,
    list::List,
    list_result::ListResult,
    no_args::NoArgs,
    opid::{OpId, Opid},
    status::{Status, StatusCode},
    version::Version,
};

pub const VERSION: u32 = 1;

const FXP_INIT: u8 = 1;
const FXP_VERSION: u8 = 2;

const FXP_MAKE_OPID: u8 = 10;
const FXP_LIST: u8 = 11;
const FXP_LIST_RECURSIVE: u8 = 12;
const FXP_WAIT: u8 = 13;
const FXP_READ_LIST: u8 = 14;
const FXP_CLOSE: u8 = 15;
const FXP_GET_FAVORITES: u8 = 16;

const FXP_STATUS: u8 = 101;
const FXP_OPID: u8 = 102;
const FXP_LIST_RESULT: u8 = 103;
const FXP_FAVORITES: u8 = 104;

pub(crate) trait RequestId: Sized {
    fn get_request_id(&self) -> u32;
}

macro_rules! impl_request_id {
    ($packet:ty) => {
        impl RequestId for $packet {
            fn get_request_id(&self) -> u32 {
                self.id
            }
        }
    };
}

macro_rules! impl_packet_for {
    ($name:ident, $packet:ty) => {
        impl From<$name> for $packet {
            fn from(input: $name) -> Self {
                Self::$name(input)
            }
        }
    };
}

pub(crate) use impl_packet_for;
pub(crate) use impl_request_id;

fn frame(r#type: u8, payload: &Bytes) -> Bytes {
    #[allow(clippy::cast_possible_truncation)]
    let length = payload.len() as u32 + 1;

    let mut bytes = BytesMut::with_capacity(payload.len() + 5);
    bytes.put_u32(length);
    bytes.put_u8(r#type);
    bytes.put_slice(payload);
    bytes.freeze()
}

/// Packets sent by the client
#[derive(Debug, PartialEq, Eq)]
pub enum Request {
    Init(Init),
    MakeOpid(NoArgs),
    List(List),
    ListRecursive(List),
    Wait(Opid),
    ReadList(Opid),
    Close(Opid),
    GetFavorites(NoArgs),
}

impl Request {
    /// Request id used to route the reply. `None` for the handshake
    pub fn request_id(&self) -> Option<u32> {
        match self {
            Self::Init(_) => None,
            Self::MakeOpid(p) | Self::GetFavorites(p) => Some(p.get_request_id()),
            Self::List(p) | Self::ListRecursive(p) => Some(p.get_request_id()),
            Self::Wait(p) | Self::ReadList(p) | Self::Close(p) => Some(p.get_request_id()),
        }
    }
}

impl From<Request> for Bytes {
    fn from(request: Request) -> Self {
        let (r#type, payload): (u8, Bytes) = match request {
            Request::Init(init) => (FXP_INIT, init.into()),
            Request::MakeOpid(p) => (FXP_MAKE_OPID, p.into()),
            Request::List(p) => (FXP_LIST, p.into()),
            Request::ListRecursive(p) => (FXP_LIST_RECURSIVE, p.into()),
            Request::Wait(p) => (FXP_WAIT, p.into()),
            Request::ReadList(p) => (FXP_READ_LIST, p.into()),
            Request::Close(p) => (FXP_CLOSE, p.into()),
            Request::GetFavorites(p) => (FXP_GET_FAVORITES, p.into()),
        };

        frame(r#type, &payload)
    }
}

impl TryFrom<&mut Bytes> for Request {
    type Error = Error;

    fn try_from(bytes: &mut Bytes) -> Result<Self, Self::Error> {
        let r#type = bytes.try_get_u8()?;
        trace!("request packet type {}", r#type);

        let request = match r#type {
            FXP_INIT => Self::Init(Init::try_from(bytes)?),
            FXP_MAKE_OPID => Self::MakeOpid(NoArgs::try_from(bytes)?),
            FXP_LIST => Self::List(List::try_from(bytes)?),
            FXP_LIST_RECURSIVE => Self::ListRecursive(List::try_from(bytes)?),
            FXP_WAIT => Self::Wait(Opid::try_from(bytes)?),
            FXP_READ_LIST => Self::ReadList(Opid::try_from(bytes)?),
            FXP_CLOSE => Self::Close(Opid::try_from(bytes)?),
            FXP_GET_FAVORITES => Self::GetFavorites(NoArgs::try_from(bytes)?),
            other => return Err(Error::BadMessage(format!("unknown request type {other}"))),
        };

        Ok(request)
    }
}

/// Packets sent by the server
#[derive(Debug, PartialEq, Eq)]
pub enum Response {
    Version(Version),
    Status(Status),
    Opid(Opid),
    ListResult(ListResult),
    Favorites(Favorites),
}

impl Response {
    pub fn error(id: u32, status_code: StatusCode) -> Self {
        Self::Status(Status::error(id, status_code))
    }

    /// Request id this reply answers. `None` for the handshake
    pub fn request_id(&self) -> Option<u32> {
        match self {
            Self::Version(_) => None,
            Self::Status(p) => Some(p.get_request_id()),
            Self::Opid(p) => Some(p.get_request_id()),
            Self::ListResult(p) => Some(p.get_request_id()),
            Self::Favorites(p) => Some(p.get_request_id()),
        }
    }
}

impl From<Response> for Bytes {
    fn from(response: Response) -> Self {
        let (r#type, payload): (u8, Bytes) = match response {
            Response::Version(version) => (FXP_VERSION, version.into()),
            Response::Status(status) => (FXP_STATUS, status.into()),
            Response::Opid(opid) => (FXP_OPID, opid.into()),
            Response::ListResult(result) => (FXP_LIST_RESULT, result.into()),
            Response::Favorites(favorites) => (FXP_FAVORITES, favorites.into()),
        };

        frame(r#type, &payload)
    }
}

impl TryFrom<&mut Bytes> for Response {
    type Error = Error;

    fn try_from(bytes: &mut Bytes) -> Result<Self, Self::Error> {
        let r#type = bytes.try_get_u8()?;
        trace!("response packet type {}", r#type);

        let response = match r#type {
            FXP_VERSION => Self::Version(Version::try_from(bytes)?),
            FXP_STATUS => Self::Status(Status::try_from(bytes)?),
            FXP_OPID => Self::Opid(Opid::try_from(bytes)?),
            FXP_LIST_RESULT => Self::ListResult(ListResult::try_from(bytes)?),
            FXP_FAVORITES => Self::Favorites(Favorites::try_from(bytes)?),
            other => return Err(Error::BadMessage(format!("unknown response type {other}"))),
        };

        Ok(response)
    }
}
