use super::rawsession::SessionResult;
use crate::protocol::{DirEntry, FavoriteEntry, ListResult, OpId};

/// One batch of entries returned by a single read of a job.
/// A page never says whether it is the last one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultPage {
    pub entries: Vec<DirEntry>,
}

impl ResultPage {
    pub const fn new(entries: Vec<DirEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<ListResult> for ResultPage {
    fn from(result: ListResult) -> Self {
        Self::new(result.entries)
    }
}

impl IntoIterator for ResultPage {
    type Item = DirEntry;
    type IntoIter = std::vec::IntoIter<DirEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Remote surface consumed by the listing components. [`RawSession`](super::RawSession)
/// implements it over the wire; tests substitute an in-memory fake.
///
/// Every operation id returned by [`create_operation`](RemoteFs::create_operation)
/// must eventually be passed to [`close`](RemoteFs::close) exactly once.
#[async_trait]
pub trait RemoteFs: Send + Sync {
    /// Allocates a new operation id.
    async fn create_operation(&self) -> SessionResult<OpId>;

    /// Submits a listing of the immediate children of `path`.
    async fn start_list(&self, opid: OpId, path: &str) -> SessionResult<()>;

    /// Submits a listing of the whole subtree below `path`.
    async fn start_list_recursive(&self, opid: OpId, path: &str) -> SessionResult<()>;

    /// Suspends until the job under `opid` finished on the remote side.
    async fn wait(&self, opid: OpId) -> SessionResult<()>;

    /// Reads the next page. An error status ends the pages; `Eof` marks
    /// regular exhaustion.
    async fn read_page(&self, opid: OpId) -> SessionResult<ResultPage>;

    /// Releases `opid`.
    async fn close(&self, opid: OpId) -> SessionResult<()>;

    /// Fetches the favorites registry.
    async fn list_favorites(&self) -> SessionResult<Vec<FavoriteEntry>>;
}
