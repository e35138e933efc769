use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use super::{error::Error, rawsession::SessionResult, CollectSink, RemoteFs, ResultPage};
use crate::{
    protocol::{
        DirEntry, DirentKind, FavoriteEntry, Favorites, ListResult, OpId, Opid, Status,
        StatusCode,
    },
    server,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn file(name: &str, size: u64) -> DirEntry {
    DirEntry {
        name: name.to_owned(),
        kind: DirentKind::File,
        size,
        ..Default::default()
    }
}

pub fn names(sink: &CollectSink) -> Vec<String> {
    sink.entries().iter().map(|entry| entry.name.clone()).collect()
}

/// Remote call that answers with an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Create,
    Start,
    Wait,
    Read,
    Close,
    Favorites,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calls {
    pub creates: usize,
    pub closes: usize,
    pub lists: usize,
    pub recursive_lists: usize,
    pub waits: usize,
    pub reads: usize,
    pub favorites: usize,
}

enum Job {
    Idle,
    Missing,
    Pages(VecDeque<Vec<DirEntry>>),
}

#[derive(Default)]
struct State {
    calls: Calls,
    next_opid: u128,
    jobs: HashMap<OpId, Job>,
}

fn status(code: StatusCode) -> Error {
    Error::Status(Status::error(0, code))
}

/// In-memory remote tree. Directories map to their immediate entries;
/// a listing of a path that is not a directory fails its wait
pub struct FakeRemote {
    dirs: BTreeMap<String, Vec<DirEntry>>,
    favorites: Vec<FavoriteEntry>,
    page_size: usize,
    fail: Option<FailAt>,
    blocking_wait: bool,
    leading_empty_page: bool,
    state: Mutex<State>,
}

impl Default for FakeRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            dirs: BTreeMap::new(),
            favorites: Vec::new(),
            page_size: 64,
            fail: None,
            blocking_wait: false,
            leading_empty_page: false,
            state: Mutex::default(),
        }
    }

    pub fn with_dir(mut self, path: &str, entries: Vec<DirEntry>) -> Self {
        let _ = self.dirs.insert(path.to_owned(), entries);
        self
    }

    pub fn with_favorites(mut self, favorites: Vec<FavoriteEntry>) -> Self {
        self.favorites = favorites;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn failing_at(mut self, fail: FailAt) -> Self {
        self.fail = Some(fail);
        self
    }

    /// Waits never complete
    pub fn blocking_wait(mut self) -> Self {
        self.blocking_wait = true;
        self
    }

    /// Every job answers its first read with a page of no entries
    pub fn with_leading_empty_page(mut self) -> Self {
        self.leading_empty_page = true;
        self
    }

    pub fn calls(&self) -> Calls {
        self.state().calls
    }

    pub fn open_operations(&self) -> usize {
        self.state().jobs.len()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fails_at(&self, at: FailAt) -> SessionResult<()> {
        match self.fail {
            Some(FailAt::Create) if at == FailAt::Create => {
                Err(status(StatusCode::ResourceExhausted))
            }
            Some(fail) if fail == at => Err(status(StatusCode::Failure)),
            _ => Ok(()),
        }
    }

    fn subtree(&self, path: &str) -> Vec<DirEntry> {
        let base = path.trim_end_matches('/');
        let mut entries = self.dirs.get(path).cloned().unwrap_or_default();

        for (dir, children) in &self.dirs {
            let Some(relative) = dir
                .strip_prefix(base)
                .and_then(|rest| rest.strip_prefix('/'))
                .filter(|rest| !rest.is_empty())
            else {
                continue;
            };

            entries.extend(children.iter().map(|child| DirEntry {
                name: format!("{relative}/{}", child.name),
                ..child.clone()
            }));
        }

        entries
    }

    fn submit(&self, opid: OpId, path: &str, recursive: bool) -> SessionResult<()> {
        let pages = if self.dirs.contains_key(path) {
            let entries = if recursive {
                self.subtree(path)
            } else {
                self.dirs.get(path).cloned().unwrap_or_default()
            };
            let mut pages: VecDeque<Vec<DirEntry>> =
                entries.chunks(self.page_size).map(<[DirEntry]>::to_vec).collect();
            if self.leading_empty_page {
                pages.push_front(Vec::new());
            }
            Job::Pages(pages)
        } else {
            Job::Missing
        };

        let mut state = self.state();
        if recursive {
            state.calls.recursive_lists += 1;
        } else {
            state.calls.lists += 1;
        }
        self.fails_at(FailAt::Start)?;

        match state.jobs.get_mut(&opid) {
            Some(job @ Job::Idle) => {
                *job = pages;
                Ok(())
            }
            Some(_) => Err(status(StatusCode::OpidInUse)),
            None => Err(status(StatusCode::UnknownOpid)),
        }
    }
}

#[async_trait]
impl RemoteFs for FakeRemote {
    async fn create_operation(&self) -> SessionResult<OpId> {
        let mut state = self.state();
        state.calls.creates += 1;
        self.fails_at(FailAt::Create)?;

        state.next_opid += 1;
        let opid = OpId::from(state.next_opid);
        let _ = state.jobs.insert(opid, Job::Idle);
        Ok(opid)
    }

    async fn start_list(&self, opid: OpId, path: &str) -> SessionResult<()> {
        self.submit(opid, path, false)
    }

    async fn start_list_recursive(&self, opid: OpId, path: &str) -> SessionResult<()> {
        self.submit(opid, path, true)
    }

    async fn wait(&self, opid: OpId) -> SessionResult<()> {
        let outcome = {
            let mut state = self.state();
            state.calls.waits += 1;
            self.fails_at(FailAt::Wait).and_then(|()| match state.jobs.get(&opid) {
                Some(Job::Pages(_)) => Ok(()),
                Some(Job::Missing) => Err(status(StatusCode::NoSuchFile)),
                Some(Job::Idle) => Err(status(StatusCode::Failure)),
                None => Err(status(StatusCode::UnknownOpid)),
            })
        };

        if self.blocking_wait {
            std::future::pending::<()>().await;
        }

        outcome
    }

    async fn read_page(&self, opid: OpId) -> SessionResult<ResultPage> {
        let mut state = self.state();
        state.calls.reads += 1;
        self.fails_at(FailAt::Read)?;

        match state.jobs.get_mut(&opid) {
            Some(Job::Pages(pages)) => pages
                .pop_front()
                .map(ResultPage::new)
                .ok_or_else(|| status(StatusCode::Eof)),
            Some(_) => Err(status(StatusCode::Failure)),
            None => Err(status(StatusCode::UnknownOpid)),
        }
    }

    async fn close(&self, opid: OpId) -> SessionResult<()> {
        let mut state = self.state();
        state.calls.closes += 1;

        let known = state.jobs.remove(&opid).is_some();
        self.fails_at(FailAt::Close)?;

        if known {
            Ok(())
        } else {
            Err(status(StatusCode::UnknownOpid))
        }
    }

    async fn list_favorites(&self) -> SessionResult<Vec<FavoriteEntry>> {
        self.state().calls.favorites += 1;
        self.fails_at(FailAt::Favorites)?;

        Ok(self.favorites.clone())
    }
}

/// Serves a [`FakeRemote`] over the wire
pub struct ServedRemote(pub Arc<FakeRemote>);

fn code(err: &Error) -> StatusCode {
    err.status_code().unwrap_or(StatusCode::Failure)
}

#[async_trait]
impl server::Handler for ServedRemote {
    type Error = StatusCode;

    fn unimplemented(&self) -> Self::Error {
        StatusCode::OpUnsupported
    }

    async fn make_opid(&self, id: u32) -> Result<Opid, Self::Error> {
        let opid = self.0.create_operation().await.map_err(|err| code(&err))?;
        Ok(Opid { id, opid })
    }

    async fn list(&self, id: u32, opid: OpId, path: String) -> Result<Status, Self::Error> {
        self.0.start_list(opid, &path).await.map_err(|err| code(&err))?;
        Ok(Status::ok(id))
    }

    async fn list_recursive(
        &self,
        id: u32,
        opid: OpId,
        path: String,
    ) -> Result<Status, Self::Error> {
        self.0
            .start_list_recursive(opid, &path)
            .await
            .map_err(|err| code(&err))?;
        Ok(Status::ok(id))
    }

    async fn wait(&self, id: u32, opid: OpId) -> Result<Status, Self::Error> {
        self.0.wait(opid).await.map_err(|err| code(&err))?;
        Ok(Status::ok(id))
    }

    async fn read_list(&self, id: u32, opid: OpId) -> Result<ListResult, Self::Error> {
        let page = self.0.read_page(opid).await.map_err(|err| code(&err))?;
        Ok(ListResult {
            id,
            entries: page.entries,
        })
    }

    async fn close(&self, id: u32, opid: OpId) -> Result<Status, Self::Error> {
        self.0.close(opid).await.map_err(|err| code(&err))?;
        Ok(Status::ok(id))
    }

    async fn get_favorites(&self, id: u32) -> Result<Favorites, Self::Error> {
        let folders = self.0.list_favorites().await.map_err(|err| code(&err))?;
        Ok(Favorites { id, folders })
    }
}
