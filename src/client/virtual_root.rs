use std::sync::Arc;

use super::{error::ListError, ListContext, Path, RemoteFs, ResultPage, ResultSink};
use crate::protocol::{DirEntry, FavoriteEntry};

/// Which of the two virtual roots a path names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Privacy {
    Public,
    Private,
}

impl Privacy {
    const fn admits(self, favorite: &FavoriteEntry) -> bool {
        match self {
            Self::Private => favorite.private,
            Self::Public => !favorite.private,
        }
    }
}

/// Lexically cleans a slash separated path: repeated separators collapse,
/// `.` components drop, `..` removes the preceding component and is
/// discarded at the root. An empty result is `.`, or `/` for rooted paths
pub(crate) fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    let _ = parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            part => parts.push(part),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_owned(),
        (false, false) => joined,
    }
}

/// Comparison form of a path: lowercase, forward slashes, cleaned
pub fn normalize(path: &str) -> String {
    clean(&path.to_lowercase().replace('\\', "/"))
}

/// Answers listings of the public and private roots from the favorites
/// registry instead of submitting a remote job
pub struct VirtualRootHandler<R: RemoteFs> {
    remote: Arc<R>,
    private_root: String,
    public_root: String,
}

impl<R: RemoteFs> VirtualRootHandler<R> {
    pub fn new(remote: Arc<R>, ctx: &ListContext) -> Self {
        Self {
            remote,
            private_root: normalize(&ctx.config().private_root),
            public_root: normalize(&ctx.config().public_root),
        }
    }

    /// Returns the root `path` names, if any. Matching ignores case and
    /// separator style
    pub fn detect(&self, path: &Path) -> Option<Privacy> {
        if !path.is_remote() {
            return None;
        }

        let normalized = normalize(path.as_str());
        if normalized == self.private_root {
            Some(Privacy::Private)
        } else if normalized == self.public_root {
            Some(Privacy::Public)
        } else {
            None
        }
    }

    /// Lists `path` from favorites when it is a virtual root. Returns
    /// `Ok(None)` for any other path without touching the remote side
    pub async fn handle(
        &self,
        path: &Path,
        sink: &mut dyn ResultSink,
    ) -> Result<Option<usize>, ListError> {
        let Some(privacy) = self.detect(path) else {
            return Ok(None);
        };

        let page = self.favorites(path, privacy).await?;
        let count = page.len();
        debug!("{} favorites under {}", count, path);

        sink.begin(path);
        sink.accept(page);
        Ok(Some(count))
    }

    /// One directory entry per favorite of the given privacy, in registry order
    pub(crate) async fn favorites(
        &self,
        path: &Path,
        privacy: Privacy,
    ) -> Result<ResultPage, ListError> {
        let folders = self
            .remote
            .list_favorites()
            .await
            .map_err(|source| ListError::Favorites {
                path: path.to_string(),
                source,
            })?;

        Ok(ResultPage::new(
            folders
                .iter()
                .filter(|favorite| privacy.admits(favorite))
                .map(|favorite| DirEntry::directory(favorite.name.as_str()))
                .collect(),
        ))
    }
}
