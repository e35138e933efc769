use super::error::Error;
use crate::protocol::{Favorites, ListResult, Opid, Status, Version};

/// Client stream handler. This is `async_trait`
#[async_trait]
pub trait Handler: Sized {
    type Error: Into<Error>;

    /// Called on the handshake reply.
    #[allow(unused_variables)]
    async fn version(&mut self, version: Version) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called on a status reply.
    #[allow(unused_variables)]
    async fn status(&mut self, status: Status) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called when the remote side allocated an operation id.
    #[allow(unused_variables)]
    async fn opid(&mut self, opid: Opid) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called on a page of listing results.
    #[allow(unused_variables)]
    async fn list_result(&mut self, result: ListResult) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called on the favorites reply.
    #[allow(unused_variables)]
    async fn favorites(&mut self, favorites: Favorites) -> Result<(), Self::Error> {
        Ok(())
    }
}
