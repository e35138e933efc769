//! Client side of the listing protocol.
//!
//! [`RawSession`] speaks the wire protocol over any byte stream and implements
//! [`RemoteFs`], the capability set the listing components are built on:
//!
//! - [`PathResolver`] turns raw arguments into remote paths
//! - [`VirtualRootHandler`] serves the public and private roots from favorites
//! - [`AsyncOperationClient`] drives one create/start/wait/read/close job
//! - [`ResultSink`] receives the pages in order
//!
//! [`Lister`] ties them together for one invocation.

mod config;
pub mod error;
mod handler;
mod lister;
mod operation;
mod path;
pub mod rawsession;
mod remote;
mod sink;
#[cfg(test)]
pub(crate) mod testing;
mod virtual_root;

pub use config::{ClientConfig, ListContext};
pub use error::ListError;
pub use handler::Handler;
pub use lister::{ListReport, Lister};
pub use operation::{AsyncOperationClient, ListRequest, OpState, Operation, PageRead};
pub use path::{Glob, Path, PathResolver};
pub use rawsession::RawSession;
pub use remote::{RemoteFs, ResultPage};
pub use sink::{CollectSink, ResultSink, WriterSink};
pub use virtual_root::{normalize, Privacy, VirtualRootHandler};

use bytes::Bytes;
use tokio::{
    io::{split, AsyncRead, AsyncWrite, AsyncWriteExt},
    sync::mpsc,
};

use crate::{error::Error, protocol::Response, utils::read_packet};

macro_rules! into_wrap {
    ($handler:expr) => {
        match $handler.await {
            Err(error) => Err(error.into()),
            Ok(()) => Ok(()),
        }
    };
}

async fn execute_handler<H>(bytes: &mut Bytes, handler: &mut H) -> Result<(), error::Error>
where
    H: Handler + Send,
{
    match Response::try_from(bytes)? {
        Response::Version(p) => into_wrap!(handler.version(p)),
        Response::Status(p) => into_wrap!(handler.status(p)),
        Response::Opid(p) => into_wrap!(handler.opid(p)),
        Response::ListResult(p) => into_wrap!(handler.list_result(p)),
        Response::Favorites(p) => into_wrap!(handler.favorites(p)),
    }
}

async fn process_handler<S, H>(stream: &mut S, handler: &mut H) -> Result<(), Error>
where
    S: AsyncRead + Unpin,
    H: Handler + Send,
{
    let mut bytes = read_packet(stream).await?;
    if let Err(err) = execute_handler(&mut bytes, handler).await {
        warn!("{}", err);
    }

    Ok(())
}

/// Run processing stream as a listing client. Replies are passed to `handler`;
/// requests written to the returned sender go out on the stream. Sending an
/// empty buffer shuts the write half down
pub fn run<S, H>(stream: S, mut handler: H) -> mpsc::UnboundedSender<Bytes>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    H: Handler + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();

    let (mut rd, mut wr) = split(stream);

    let _reader = tokio::spawn(async move {
        loop {
            match process_handler(&mut rd, &mut handler).await {
                Err(Error::UnexpectedEof) => break,
                Err(err) => {
                    warn!("{}", err);
                    break;
                }
                Ok(()) => (),
            }
        }

        debug!("read half of listing stream ended");
    });

    let _writer = tokio::spawn(async move {
        while let Some(data) = rx.recv().await {
            if data.is_empty() {
                let _ = wr.shutdown().await;
                break;
            }

            if let Err(err) = wr.write_all(&data[..]).await {
                warn!("{}", err);
                break;
            }
        }

        debug!("write half of listing stream ended");
    });

    tx
}
