use std::{future::Future, sync::Arc};
use tokio::time;

use super::{
    error::{Error, ListError},
    ListContext, RemoteFs, ResultPage, ResultSink,
};
use crate::protocol::{OpId, StatusCode};

/// Lifecycle of one remote job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpState {
    Created,
    Started,
    Waiting,
    Draining,
    Closed,
    Failed,
}

/// What to list and how. Fixed once submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    path: String,
    recursive: bool,
}

impl ListRequest {
    pub fn new<T: Into<String>>(path: T, recursive: bool) -> Self {
        Self {
            path: path.into(),
            recursive,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub const fn recursive(&self) -> bool {
        self.recursive
    }
}

/// Outcome of a single page read. The wire only reports errors, so `Eof`
/// is told apart from every other failure here
#[derive(Debug)]
pub enum PageRead {
    Page(ResultPage),
    Exhausted,
    Fault(Error),
}

/// Runs `fut` under the context's cancellation token and job deadline
async fn bounded<T, F>(ctx: &ListContext, path: &str, fut: F) -> Result<T, ListError>
where
    F: Future<Output = T>,
{
    let limited = async {
        match ctx.config().job_timeout() {
            Some(limit) => time::timeout(limit, fut).await.map_err(|_| ListError::Timeout {
                path: path.to_owned(),
            }),
            None => Ok(fut.await),
        }
    };

    tokio::select! {
        biased;
        () = ctx.cancellation().cancelled() => Err(ListError::Cancelled {
            path: path.to_owned(),
        }),
        result = limited => result,
    }
}

/// Allocates operation ids and drives listing jobs on them
pub struct AsyncOperationClient<R: RemoteFs + 'static> {
    remote: Arc<R>,
    ctx: ListContext,
}

impl<R: RemoteFs + 'static> AsyncOperationClient<R> {
    pub const fn new(remote: Arc<R>, ctx: ListContext) -> Self {
        Self { remote, ctx }
    }

    /// Allocates a fresh operation id for listing `path`.
    ///
    /// The returned [`Operation`] owns the id. Release it with
    /// [`Operation::close`]; if it is dropped instead, a detached close is issued.
    pub async fn create(&self, path: &str) -> Result<Operation<R>, ListError> {
        if self.ctx.cancellation().is_cancelled() {
            return Err(ListError::Cancelled {
                path: path.to_owned(),
            });
        }

        match self.remote.create_operation().await {
            Ok(opid) => {
                debug!("operation {} allocated for {}", opid, path);
                Ok(Operation {
                    remote: self.remote.clone(),
                    ctx: self.ctx.clone(),
                    opid,
                    path: path.to_owned(),
                    state: OpState::Created,
                    closed: false,
                })
            }
            Err(source) => Err(ListError::ResourceExhausted {
                path: path.to_owned(),
                source,
            }),
        }
    }

    /// Lists `request` on a fresh operation id and forwards every page to
    /// `sink` in the order it was read. Returns the number of entries
    /// forwarded. The id is closed on every exit path.
    pub async fn run(
        &self,
        request: &ListRequest,
        sink: &mut dyn ResultSink,
    ) -> Result<usize, ListError> {
        let mut operation = self.create(request.path()).await?;
        let result = operation.drive(request, sink).await;
        operation.close().await;
        result
    }
}

/// One outstanding job, exclusively owning its operation id
pub struct Operation<R: RemoteFs + 'static> {
    remote: Arc<R>,
    ctx: ListContext,
    opid: OpId,
    path: String,
    state: OpState,
    closed: bool,
}

impl<R: RemoteFs + 'static> Operation<R> {
    pub const fn id(&self) -> OpId {
        self.opid
    }

    pub const fn state(&self) -> OpState {
        self.state
    }

    fn fail(&mut self, err: ListError) -> ListError {
        self.state = OpState::Failed;
        err
    }

    /// Submits the listing job. Plain and recursive listing are separate
    /// remote calls, chosen here once.
    pub async fn start(&mut self, request: &ListRequest) -> Result<(), ListError> {
        if self.state != OpState::Created {
            return Err(ListError::SubmitFailed {
                path: request.path().to_owned(),
                source: Error::UnexpectedBehavior(format!(
                    "operation {} already has a job",
                    self.opid
                )),
            });
        }

        let submitted = if request.recursive() {
            self.remote
                .start_list_recursive(self.opid, request.path())
                .await
        } else {
            self.remote.start_list(self.opid, request.path()).await
        };

        match submitted {
            Ok(()) => {
                self.path = request.path().to_owned();
                self.state = OpState::Started;
                Ok(())
            }
            Err(source) => Err(self.fail(ListError::SubmitFailed {
                path: request.path().to_owned(),
                source,
            })),
        }
    }

    /// Suspends until the remote job finished. Returns immediately once it has.
    pub async fn wait(&mut self) -> Result<(), ListError> {
        match self.state {
            OpState::Draining => return Ok(()),
            OpState::Started => {}
            state => {
                return Err(ListError::JobFailed {
                    path: self.path.clone(),
                    source: Error::UnexpectedBehavior(format!(
                        "cannot wait on operation {} in state {state:?}",
                        self.opid
                    )),
                })
            }
        }

        self.state = OpState::Waiting;
        let outcome = bounded(&self.ctx, &self.path, self.remote.wait(self.opid)).await;

        match outcome {
            Ok(Ok(())) => {
                trace!("operation {} finished", self.opid);
                self.state = OpState::Draining;
                Ok(())
            }
            Ok(Err(source)) => {
                let path = self.path.clone();
                Err(self.fail(ListError::JobFailed { path, source }))
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Reads the next page. Only cancellation and the job deadline are
    /// reported as `Err`; remote errors come back as [`PageRead`].
    pub async fn read_page(&mut self) -> Result<PageRead, ListError> {
        if self.state != OpState::Draining {
            return Ok(PageRead::Fault(Error::UnexpectedBehavior(format!(
                "operation {} is not ready to be read",
                self.opid
            ))));
        }

        let outcome = bounded(&self.ctx, &self.path, self.remote.read_page(self.opid)).await;

        match outcome {
            Ok(Ok(page)) => Ok(PageRead::Page(page)),
            Ok(Err(err)) if err.status_code() == Some(StatusCode::Eof) => Ok(PageRead::Exhausted),
            Ok(Err(err)) => Ok(PageRead::Fault(err)),
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Reads pages into `sink` until the first read that is not a page.
    /// A read fault ends the listing like exhaustion does; it is logged,
    /// not returned.
    pub async fn drain(&mut self, sink: &mut dyn ResultSink) -> Result<usize, ListError> {
        let mut forwarded = 0;

        loop {
            match self.read_page().await? {
                PageRead::Page(page) => {
                    if page.is_empty() {
                        trace!("operation {} returned an empty page", self.opid);
                    }
                    forwarded += page.len();
                    sink.accept(page);
                }
                PageRead::Exhausted => {
                    debug!("operation {} exhausted after {} entries", self.opid, forwarded);
                    break;
                }
                PageRead::Fault(err) => {
                    warn!("operation {}: reading stopped by {}", self.opid, err);
                    break;
                }
            }
        }

        Ok(forwarded)
    }

    async fn drive(
        &mut self,
        request: &ListRequest,
        sink: &mut dyn ResultSink,
    ) -> Result<usize, ListError> {
        self.start(request).await?;
        self.wait().await?;
        self.drain(sink).await
    }

    /// Releases the operation id. Close errors are logged and dropped.
    pub async fn close(mut self) {
        self.closed = true;

        if let Err(err) = self.remote.close(self.opid).await {
            warn!("closing operation {}: {}", self.opid, err);
        }

        self.state = OpState::Closed;
        trace!("operation {} closed", self.opid);
    }
}

impl<R: RemoteFs + 'static> Drop for Operation<R> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        let remote = self.remote.clone();
        let opid = self.opid;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("operation {} dropped while open, closing in background", opid);
                let _closing = handle.spawn(async move {
                    if let Err(err) = remote.close(opid).await {
                        warn!("closing operation {}: {}", opid, err);
                    }
                });
            }
            Err(_) => warn!("operation {} dropped outside a runtime and left open", opid),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::client::{
        testing::{file, init_logger, names, FailAt, FakeRemote},
        ClientConfig, CollectSink,
    };

    fn client(remote: &Arc<FakeRemote>) -> AsyncOperationClient<FakeRemote> {
        AsyncOperationClient::new(remote.clone(), ListContext::default())
    }

    fn three_files() -> FakeRemote {
        FakeRemote::new().with_dir("/private/bob", vec![file("a", 1), file("b", 2), file("c", 3)])
    }

    #[tokio::test]
    async fn pages_arrive_in_read_order() {
        init_logger();
        let remote = Arc::new(three_files().with_page_size(1));
        let mut sink = CollectSink::default();

        let count = client(&remote)
            .run(&ListRequest::new("/private/bob", false), &mut sink)
            .await
            .ok();

        assert_eq!(count, Some(3));
        assert_eq!(names(&sink), ["a", "b", "c"]);
        assert_eq!(remote.calls().reads, 4);
        assert_eq!(remote.calls().closes, 1);
    }

    #[tokio::test]
    async fn empty_job_yields_nothing() {
        init_logger();
        let remote = Arc::new(FakeRemote::new().with_dir("/private/empty", vec![]));
        let mut sink = CollectSink::default();

        let count = client(&remote)
            .run(&ListRequest::new("/private/empty", false), &mut sink)
            .await
            .ok();

        assert_eq!(count, Some(0));
        assert!(sink.entries().is_empty());
        assert_eq!(remote.calls().closes, 1);
    }

    #[derive(Default)]
    struct PageSizes(Vec<usize>);

    impl ResultSink for PageSizes {
        fn accept(&mut self, page: ResultPage) {
            self.0.push(page.len());
        }
    }

    #[tokio::test]
    async fn empty_page_is_forwarded_and_reading_goes_on() {
        init_logger();
        let remote = Arc::new(three_files().with_page_size(2).with_leading_empty_page());
        let mut sink = PageSizes::default();

        let count = client(&remote)
            .run(&ListRequest::new("/private/bob", false), &mut sink)
            .await
            .ok();

        assert_eq!(count, Some(3));
        assert_eq!(sink.0, [0, 2, 1]);
        assert_eq!(remote.calls().reads, 4);
    }

    #[tokio::test]
    async fn every_created_id_is_closed_once() {
        init_logger();

        for fail in [FailAt::Start, FailAt::Wait, FailAt::Read, FailAt::Close] {
            let remote = Arc::new(three_files().failing_at(fail));
            let mut sink = CollectSink::default();

            let _ = client(&remote)
                .run(&ListRequest::new("/private/bob", false), &mut sink)
                .await;

            let calls = remote.calls();
            assert_eq!((calls.creates, calls.closes), (1, 1), "failing at {fail:?}");
            assert_eq!(remote.open_operations(), 0, "failing at {fail:?}");
        }
    }

    #[tokio::test]
    async fn failed_allocation_closes_nothing() {
        init_logger();
        let remote = Arc::new(three_files().failing_at(FailAt::Create));
        let mut sink = CollectSink::default();

        let err = client(&remote)
            .run(&ListRequest::new("/private/bob", false), &mut sink)
            .await
            .err();

        assert!(matches!(err, Some(ListError::ResourceExhausted { .. })));
        assert_eq!(remote.calls().closes, 0);
    }

    #[tokio::test]
    async fn failures_map_to_their_phase() {
        init_logger();

        let remote = Arc::new(three_files().failing_at(FailAt::Start));
        let err = client(&remote)
            .run(&ListRequest::new("/private/bob", false), &mut CollectSink::default())
            .await
            .err();
        assert!(matches!(err, Some(ListError::SubmitFailed { .. })));

        let remote = Arc::new(three_files());
        let err = client(&remote)
            .run(&ListRequest::new("/private/gone", false), &mut CollectSink::default())
            .await
            .err();
        assert!(matches!(err, Some(ListError::JobFailed { .. })));
        assert_eq!(remote.calls().closes, 1);
    }

    #[tokio::test]
    async fn read_fault_ends_listing_quietly() {
        init_logger();
        let remote = Arc::new(three_files().failing_at(FailAt::Read));
        let mut sink = CollectSink::default();

        let count = client(&remote)
            .run(&ListRequest::new("/private/bob", false), &mut sink)
            .await
            .ok();

        assert_eq!(count, Some(0));
        assert_eq!(remote.calls().reads, 1);
    }

    #[tokio::test]
    async fn fault_and_exhaustion_are_distinct() {
        init_logger();
        let remote = Arc::new(FakeRemote::new().with_dir("/public/alice", vec![]));
        let operations = client(&remote);

        let mut operation = operations.create("/public/alice").await.ok();
        let Some(op) = operation.as_mut() else {
            panic!("allocation failed");
        };

        assert!(op.start(&ListRequest::new("/public/alice", false)).await.is_ok());
        assert!(matches!(op.read_page().await, Ok(PageRead::Fault(_))));
        assert!(op.wait().await.is_ok());
        assert_eq!(op.state(), OpState::Draining);
        assert!(op.wait().await.is_ok());
        assert!(matches!(op.read_page().await, Ok(PageRead::Exhausted)));

        if let Some(op) = operation {
            op.close().await;
        }
        assert_eq!(remote.calls().waits, 1);
        assert_eq!(remote.calls().closes, 1);
    }

    #[tokio::test]
    async fn recursion_is_chosen_at_submission() {
        init_logger();
        let remote = Arc::new(three_files());
        let operations = client(&remote);

        let _ = operations
            .run(&ListRequest::new("/private/bob", true), &mut CollectSink::default())
            .await;
        let calls = remote.calls();
        assert_eq!((calls.lists, calls.recursive_lists), (0, 1));

        let _ = operations
            .run(&ListRequest::new("/private/bob", false), &mut CollectSink::default())
            .await;
        let calls = remote.calls();
        assert_eq!((calls.lists, calls.recursive_lists), (1, 1));
    }

    #[tokio::test]
    async fn second_submission_is_rejected() {
        init_logger();
        let remote = Arc::new(three_files());
        let operations = client(&remote);

        let Ok(mut op) = operations.create("/private/bob").await else {
            panic!("allocation failed");
        };
        assert!(op.start(&ListRequest::new("/private/bob", true)).await.is_ok());
        let err = op.start(&ListRequest::new("/private/bob", false)).await.err();
        op.close().await;

        assert!(matches!(err, Some(ListError::SubmitFailed { .. })));
        assert_eq!(remote.calls().lists, 0);
        assert_eq!(remote.calls().recursive_lists, 1);
    }

    #[tokio::test]
    async fn cancellation_still_closes() {
        init_logger();
        let remote = Arc::new(three_files().blocking_wait());
        let cancel = CancellationToken::new();
        let operations = AsyncOperationClient::new(
            remote.clone(),
            ListContext::default().with_cancellation(cancel.clone()),
        );

        let canceller = tokio::spawn(async move {
            time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });

        let err = operations
            .run(&ListRequest::new("/private/bob", false), &mut CollectSink::default())
            .await
            .err();
        let _ = canceller.await;

        assert!(matches!(err, Some(ListError::Cancelled { .. })));
        assert_eq!(remote.calls().closes, 1);
    }

    #[tokio::test]
    async fn deadline_fails_the_wait() {
        init_logger();
        let remote = Arc::new(three_files().blocking_wait());
        let ctx = ListContext::new(ClientConfig::default().with_job_timeout(0));
        let operations = AsyncOperationClient::new(remote.clone(), ctx);

        let err = operations
            .run(&ListRequest::new("/private/bob", false), &mut CollectSink::default())
            .await
            .err();

        assert!(matches!(err, Some(ListError::Timeout { .. })));
        assert_eq!(remote.calls().closes, 1);
    }

    #[tokio::test]
    async fn dropped_operation_is_closed_in_background() {
        init_logger();
        let remote = Arc::new(three_files());

        let op = client(&remote).create("/private/bob").await.ok();
        assert!(op.is_some());
        drop(op);

        for _ in 0..50 {
            if remote.calls().closes == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(remote.calls().closes, 1);
        assert_eq!(remote.open_operations(), 0);
    }
}
