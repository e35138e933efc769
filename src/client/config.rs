use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;

/// Client settings. Every field has a default, so a partial document
/// deserializes into a complete configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Maximum time in seconds to wait for the reply to a single request
    pub timeout_secs: u64,
    /// Deadline in seconds for waiting on a job and for each page read.
    /// `None` waits as long as the remote side needs
    pub job_timeout_secs: Option<u64>,
    /// Leading component that marks an argument as a remote path
    pub mount_prefix: String,
    pub private_root: String,
    pub public_root: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            job_timeout_secs: None,
            mount_prefix: "/keybase".to_owned(),
            private_root: "/private".to_owned(),
            public_root: "/public".to_owned(),
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn with_job_timeout(mut self, secs: u64) -> Self {
        self.job_timeout_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn with_mount_prefix<T: Into<String>>(mut self, prefix: T) -> Self {
        self.mount_prefix = prefix.into();
        self
    }

    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_secs.map(Duration::from_secs)
    }
}

/// Explicit context handed to every listing component: the configuration
/// and the token that cancels outstanding waits and reads
#[derive(Debug, Clone)]
pub struct ListContext {
    config: Arc<ClientConfig>,
    cancel: CancellationToken,
}

impl ListContext {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
            cancel: CancellationToken::new(),
        }
    }

    /// Replaces the cancellation token, typically with a child of a
    /// caller-owned token
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Default for ListContext {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}
