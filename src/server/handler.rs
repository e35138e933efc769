use crate::protocol::{Favorites, ListResult, OpId, Opid, Status, StatusCode, Version};

/// Server side of the listing protocol. Every request has a default that
/// answers with [`Handler::unimplemented`], except the handshake.
///
/// Requests are served concurrently, so a `wait` that blocks does not hold
/// up requests for other operations
#[async_trait]
pub trait Handler: Sized + Send + Sync {
    type Error: Into<StatusCode>;

    /// The error returned for requests the implementation does not serve
    fn unimplemented(&self) -> Self::Error;

    #[allow(unused_variables)]
    async fn init(&self, version: u32) -> Result<Version, Self::Error> {
        Ok(Version::new())
    }

    /// Allocates a new operation id
    #[allow(unused_variables)]
    async fn make_opid(&self, id: u32) -> Result<Opid, Self::Error> {
        Err(self.unimplemented())
    }

    /// Submits a listing of the immediate children of `path` under `opid`.
    /// Must return without waiting for the job
    #[allow(unused_variables)]
    async fn list(&self, id: u32, opid: OpId, path: String) -> Result<Status, Self::Error> {
        Err(self.unimplemented())
    }

    /// Submits a listing of the whole subtree below `path` under `opid`
    #[allow(unused_variables)]
    async fn list_recursive(
        &self,
        id: u32,
        opid: OpId,
        path: String,
    ) -> Result<Status, Self::Error> {
        Err(self.unimplemented())
    }

    /// Answers once the job under `opid` has finished
    #[allow(unused_variables)]
    async fn wait(&self, id: u32, opid: OpId) -> Result<Status, Self::Error> {
        Err(self.unimplemented())
    }

    /// Returns the next page of results. A drained job answers with
    /// [`StatusCode::Eof`]
    #[allow(unused_variables)]
    async fn read_list(&self, id: u32, opid: OpId) -> Result<ListResult, Self::Error> {
        Err(self.unimplemented())
    }

    #[allow(unused_variables)]
    async fn close(&self, id: u32, opid: OpId) -> Result<Status, Self::Error> {
        Err(self.unimplemented())
    }

    #[allow(unused_variables)]
    async fn get_favorites(&self, id: u32) -> Result<Favorites, Self::Error> {
        Err(self.unimplemented())
    }
}
