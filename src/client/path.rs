use regex::Regex;
use std::{fmt, sync::Arc};

use super::{
    error::ListError, AsyncOperationClient, CollectSink, ListContext, ListRequest, RemoteFs,
    VirtualRootHandler,
};
use crate::protocol::DirEntry;

/// A classified listing argument
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Path {
    /// Path inside the remote tree, relative to the mount prefix and always
    /// starting with `/`
    Remote(String),
    /// Anything outside the mount prefix, kept as given
    Unsupported(String),
}

impl Path {
    /// Classifies `raw` against `mount_prefix`. Backslashes count as separators
    pub fn classify(raw: &str, mount_prefix: &str) -> Self {
        let unified = raw.replace('\\', "/");
        let prefix = mount_prefix.trim_end_matches('/');

        match unified.strip_prefix(prefix) {
            Some("") => Self::Remote("/".to_owned()),
            Some(rest) if rest.starts_with('/') => Self::Remote(rest.to_owned()),
            _ => Self::Unsupported(raw.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Remote(path) | Self::Unsupported(path) => path,
        }
    }

    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn has_wildcards(component: &str) -> bool {
    component.contains(['*', '?', '['])
}

/// Appends the bracket class that starts right after `[`. Returns how many
/// chars the class used including the closing `]`, or `None` if it is unclosed
fn push_class(out: &mut String, class: &[char]) -> Option<usize> {
    let negated = matches!(class.first(), Some('!' | '^'));
    let start = usize::from(negated);
    // a `]` right after the opening bracket is a member, not the end
    let end = class.iter().skip(start + 1).position(|&c| c == ']')? + start + 1;
    let members = class.get(start..end)?;

    out.push('[');
    if negated {
        out.push('^');
    }
    for (i, &c) in members.iter().enumerate() {
        if c == '-' && i > 0 && i + 1 < members.len() {
            out.push('-');
        } else {
            out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
        }
    }
    out.push(']');

    Some(end + 1)
}

/// Convert a shell wildcard to an anchored regex pattern
fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("^");
    let mut i = 0;

    while let Some(&c) = chars.get(i) {
        i += 1;
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => match chars.get(i..).and_then(|class| push_class(&mut out, class)) {
                Some(used) => i += used,
                None => out.push_str(r"\["),
            },
            c => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }

    out.push('$');
    out
}

/// Compiled name pattern: `*` matches any run of characters, `?` any one
/// character, `[...]` a class with ranges and `!` or `^` negation. An
/// unclosed `[` matches itself
#[derive(Debug, Clone)]
pub struct Glob {
    regex: Regex,
}

impl Glob {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(&glob_to_regex(pattern))?,
        })
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// Turns raw listing arguments into remote paths, expanding a wildcard in
/// the last component against a listing of its parent
pub struct PathResolver<R: RemoteFs + 'static> {
    operations: AsyncOperationClient<R>,
    virtual_roots: VirtualRootHandler<R>,
    mount_prefix: String,
}

impl<R: RemoteFs + 'static> PathResolver<R> {
    pub fn new(remote: Arc<R>, ctx: &ListContext) -> Self {
        Self {
            operations: AsyncOperationClient::new(remote.clone(), ctx.clone()),
            virtual_roots: VirtualRootHandler::new(remote, ctx),
            mount_prefix: ctx.config().mount_prefix.clone(),
        }
    }

    /// Resolves one argument into one or more remote paths, in the order the
    /// parent listing returned them. Wildcards before the last component
    /// are passed through literally
    pub async fn resolve(&self, raw: &str) -> Result<Vec<Path>, ListError> {
        let path = Path::classify(raw, &self.mount_prefix);
        if !path.is_remote() {
            return Err(ListError::InvalidPathType(raw.to_owned()));
        }

        let trimmed = path.as_str().trim_end_matches('/');
        let Some((parent, pattern)) = trimmed.rsplit_once('/') else {
            return Ok(vec![path]);
        };
        if !has_wildcards(pattern) {
            return Ok(vec![path]);
        }

        let glob = Glob::new(pattern).map_err(|err| {
            debug!("{}: {}", raw, err);
            ListError::InvalidPattern(raw.to_owned())
        })?;

        let parent = if parent.is_empty() { "/" } else { parent };
        let entries = self.list_parent(parent).await?;

        let matches: Vec<Path> = entries
            .into_iter()
            .filter(|entry| glob.is_match(&entry.name))
            .map(|entry| Path::Remote(join(parent, &entry.name)))
            .collect();

        debug!("{} expanded to {} paths", raw, matches.len());
        if matches.is_empty() {
            return Err(ListError::NoMatch(raw.to_owned()));
        }

        Ok(matches)
    }

    async fn list_parent(&self, parent: &str) -> Result<Vec<DirEntry>, ListError> {
        let parent_path = Path::Remote(parent.to_owned());

        if let Some(privacy) = self.virtual_roots.detect(&parent_path) {
            let page = self.virtual_roots.favorites(&parent_path, privacy).await?;
            return Ok(page.entries);
        }

        let mut sink = CollectSink::default();
        let _ = self
            .operations
            .run(&ListRequest::new(parent, false), &mut sink)
            .await?;

        Ok(sink.into_entries())
    }
}

fn join(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}
