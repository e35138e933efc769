mod handler;

use bytes::Bytes;
use std::sync::Arc;
use tokio::{
    io::{split, AsyncRead, AsyncWrite, AsyncWriteExt},
    sync::mpsc,
    task::JoinHandle,
};

pub use self::handler::Handler;

use crate::{
    error::Error,
    protocol::{Request, Response, StatusCode},
    utils::read_packet,
};

macro_rules! into_wrap {
    ($id:expr, $handler:expr, $var:ident; $($arg:ident),*) => {
        match $handler.$var($($var.$arg),*).await {
            Err(err) => Response::error($id, err.into()),
            Ok(packet) => packet.into(),
        }
    };
}

async fn process_request<H>(request: Request, handler: &H) -> Response
where
    H: Handler,
{
    let id = request.request_id().unwrap_or_default();

    match request {
        Request::Init(init) => into_wrap!(id, handler, init; version),
        Request::MakeOpid(make_opid) => into_wrap!(id, handler, make_opid; id),
        Request::List(list) => into_wrap!(id, handler, list; id, opid, path),
        Request::ListRecursive(list_recursive) => {
            into_wrap!(id, handler, list_recursive; id, opid, path)
        }
        Request::Wait(wait) => into_wrap!(id, handler, wait; id, opid),
        Request::ReadList(read_list) => into_wrap!(id, handler, read_list; id, opid),
        Request::Close(close) => into_wrap!(id, handler, close; id, opid),
        Request::GetFavorites(get_favorites) => into_wrap!(id, handler, get_favorites; id),
    }
}

async fn process_handler<H, S>(
    stream: &mut S,
    handler: &Arc<H>,
    tx: &mpsc::UnboundedSender<Bytes>,
) -> Result<(), Error>
where
    H: Handler + 'static,
    S: AsyncRead + Unpin,
{
    let mut bytes = read_packet(stream).await?;

    match Request::try_from(&mut bytes) {
        Ok(request) => {
            let handler = Arc::clone(handler);
            let tx = tx.clone();

            let _request = tokio::spawn(async move {
                let response = process_request(request, handler.as_ref()).await;
                let _ = tx.send(Bytes::from(response));
            });
        }
        Err(err) => {
            debug!("rejecting packet: {}", err);
            let _ = tx.send(Bytes::from(Response::error(0, StatusCode::BadMessage)));
        }
    }

    Ok(())
}

/// Run processing stream as a listing server. Every request is answered from
/// its own task, so replies may leave in a different order than the requests
/// arrived. The returned handle completes when the read half ends
pub fn run<S, H>(stream: S, handler: H) -> JoinHandle<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    H: Handler + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
    let (mut rd, mut wr) = split(stream);
    let handler = Arc::new(handler);

    let _writer = tokio::spawn(async move {
        while let Some(data) = rx.recv().await {
            if let Err(err) = wr.write_all(&data[..]).await {
                warn!("{}", err);
                break;
            }
        }

        debug!("write half of listing stream ended");
    });

    tokio::spawn(async move {
        loop {
            match process_handler(&mut rd, &handler, &tx).await {
                Err(Error::UnexpectedEof) => break,
                Err(err) => {
                    warn!("{}", err);
                    break;
                }
                Ok(()) => (),
            }
        }

        debug!("listing stream ended");
    })
}
