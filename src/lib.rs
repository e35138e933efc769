//! Client and server for an asynchronous, handle-scoped remote listing protocol.
//!
//! A listing job is submitted under an operation id, waited for, and then read
//! page by page until the remote side reports the end. The public and private
//! roots are served from the favorites registry without submitting a job.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use simplefs_list::client::{ClientConfig, ListContext, Lister, RawSession, WriterSink};
//!
//! # async fn demo(stream: tokio::io::DuplexStream) -> anyhow::Result<()> {
//! let config = ClientConfig::default();
//! let session = Arc::new(RawSession::connect(stream, &config).await?);
//!
//! let lister = Lister::new(session, ListContext::new(config));
//! let mut sink = WriterSink::new(std::io::stdout());
//! let report = lister.list(&["/keybase/private/alice"], false, &mut sink).await;
//!
//! sink.finish()?;
//! report.into_result()?;
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;
#[macro_use]
extern crate async_trait;
#[macro_use]
extern crate num_derive;

mod buf;
mod error;
mod utils;

/// Client side
pub mod client;
/// Protocol implementation
pub mod protocol;
/// Server side
pub mod server;

pub use error::Error;
pub use protocol::{DirEntry, DirentKind, FavoriteEntry, OpId};
