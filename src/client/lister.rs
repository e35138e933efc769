use std::sync::Arc;

use super::{
    error::ListError, AsyncOperationClient, ListContext, ListRequest, Path, PathResolver,
    RemoteFs, ResultSink, VirtualRootHandler,
};

/// Outcome of one listing invocation
#[derive(Debug, Default)]
pub struct ListReport {
    /// Every listed path in resolution order, with the number of entries delivered
    pub listed: Vec<(Path, usize)>,
    /// Per-path failures in the order they happened
    pub failures: Vec<ListError>,
}

impl ListReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.listed.iter().map(|(_, count)| count).sum()
    }

    /// The first failure, if any, for callers that treat any failed path as
    /// a failed command
    pub fn into_result(self) -> Result<Vec<(Path, usize)>, ListError> {
        match self.failures.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.listed),
        }
    }

    fn fail(&mut self, err: ListError) {
        warn!("{}", err);
        self.failures.push(err);
    }
}

/// Lists remote paths. Arguments are resolved and listed one after the
/// other; a failing path is recorded and does not stop the ones after it
pub struct Lister<R: RemoteFs + 'static> {
    resolver: PathResolver<R>,
    virtual_roots: VirtualRootHandler<R>,
    operations: AsyncOperationClient<R>,
}

impl<R: RemoteFs + 'static> Lister<R> {
    pub fn new(remote: Arc<R>, ctx: ListContext) -> Self {
        Self {
            resolver: PathResolver::new(remote.clone(), &ctx),
            virtual_roots: VirtualRootHandler::new(remote.clone(), &ctx),
            operations: AsyncOperationClient::new(remote, ctx),
        }
    }

    /// Lists every argument into `sink`. Results of different paths are
    /// never interleaved
    pub async fn list<S: AsRef<str>>(
        &self,
        args: &[S],
        recursive: bool,
        sink: &mut dyn ResultSink,
    ) -> ListReport {
        let mut report = ListReport::default();

        if args.is_empty() {
            report.fail(ListError::NoPaths);
            return report;
        }

        for raw in args {
            let paths = match self.resolver.resolve(raw.as_ref()).await {
                Ok(paths) => paths,
                Err(err) => {
                    report.fail(err);
                    continue;
                }
            };

            for path in paths {
                match self.list_path(&path, recursive, sink).await {
                    Ok(count) => report.listed.push((path, count)),
                    Err(err) => report.fail(err),
                }
            }
        }

        info!(
            "listed {} paths, {} entries, {} failures",
            report.listed.len(),
            report.entry_count(),
            report.failures.len()
        );

        report
    }

    /// Lists one resolved path. Virtual roots are answered from favorites
    /// and never allocate an operation id
    pub async fn list_path(
        &self,
        path: &Path,
        recursive: bool,
        sink: &mut dyn ResultSink,
    ) -> Result<usize, ListError> {
        if let Some(count) = self.virtual_roots.handle(path, sink).await? {
            return Ok(count);
        }

        if !path.is_remote() {
            return Err(ListError::InvalidPathType(path.to_string()));
        }

        sink.begin(path);
        self.operations
            .run(&ListRequest::new(path.as_str(), recursive), sink)
            .await
    }
}
