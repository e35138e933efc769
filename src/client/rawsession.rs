use bytes::Bytes;
use flurry::HashMap;
use std::{
    sync::{
        atomic::{AtomicU32, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::mpsc,
    time,
};

use super::{error::Error, run, ClientConfig, Handler, RemoteFs, ResultPage};
use crate::protocol::{
    FavoriteEntry, Favorites, Init, List, ListResult, NoArgs, OpId, Opid, Request, Response,
    Status, StatusCode, Version,
};

pub type SessionResult<T> = Result<T, Error>;
type SharedRequests = HashMap<Option<u32>, mpsc::Sender<SessionResult<Response>>>;

/// Frees the reply slot of a request once its caller stops waiting, also when
/// the waiting future is dropped
struct PendingSlot<'a> {
    requests: &'a SharedRequests,
    id: Option<u32>,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        let _ = self.requests.pin().remove(&self.id);
    }
}

pub(crate) struct SessionInner {
    version: Option<u32>,
    requests: Arc<SharedRequests>,
}

impl SessionInner {
    pub fn reply(&self, id: Option<u32>, response: Response) -> SessionResult<()> {
        if let Some(sender) = self.requests.pin().remove(&id) {
            let validate = if id.is_some() && self.version.is_none() {
                Err(Error::UnexpectedPacket)
            } else if id.is_none() && self.version.is_some() {
                Err(Error::UnexpectedBehavior("Duplicate version".to_owned()))
            } else {
                Ok(())
            };

            sender
                .try_send(validate.clone().map(|()| response))
                .map_err(|e| Error::UnexpectedBehavior(e.to_string()))?;

            return validate;
        }

        Err(Error::UnexpectedBehavior(format!(
            "Packet {id:?} for unknown recipient"
        )))
    }
}

/// Pending requests can no longer be answered once the read half is gone
impl Drop for SessionInner {
    fn drop(&mut self) {
        self.requests.pin().clear();
    }
}

#[async_trait]
impl Handler for SessionInner {
    type Error = Error;

    async fn version(&mut self, packet: Version) -> Result<(), Self::Error> {
        let version = packet.version;
        self.reply(None, packet.into())?;
        self.version = Some(version);
        Ok(())
    }

    async fn status(&mut self, status: Status) -> Result<(), Self::Error> {
        self.reply(Some(status.id), status.into())
    }

    async fn opid(&mut self, opid: Opid) -> Result<(), Self::Error> {
        self.reply(Some(opid.id), opid.into())
    }

    async fn list_result(&mut self, result: ListResult) -> Result<(), Self::Error> {
        self.reply(Some(result.id), result.into())
    }

    async fn favorites(&mut self, favorites: Favorites) -> Result<(), Self::Error> {
        self.reply(Some(favorites.id), favorites.into())
    }
}

/// Implements raw work with the protocol in request-response format.
/// If the server returns a `Status` packet with the code Ok the packet is
/// returned as Ok, in other cases the status is returned as Err.
pub struct RawSession {
    tx: mpsc::UnboundedSender<Bytes>,
    requests: Arc<SharedRequests>,
    next_req_id: AtomicU32,
    operations: AtomicU64,
    timeout: AtomicU64,
}

macro_rules! into_with_status {
    ($result:ident, $packet:ident) => {
        match $result {
            Response::$packet(p) => Ok(p),
            Response::Status(p) => Err(p.into()),
            _ => Err(Error::UnexpectedPacket),
        }
    };
}

macro_rules! into_status {
    ($result:ident) => {
        match $result {
            Response::Status(status) if status.status_code == StatusCode::Ok => Ok(status),
            Response::Status(status) => Err(status.into()),
            _ => Err(Error::UnexpectedPacket),
        }
    };
}

impl RawSession {
    pub fn new<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let req_map = Arc::new(HashMap::new());
        let inner = SessionInner {
            version: None,
            requests: req_map.clone(),
        };

        Self {
            tx: run(stream, inner),
            requests: req_map,
            next_req_id: AtomicU32::new(1),
            operations: AtomicU64::new(0),
            timeout: AtomicU64::new(ClientConfig::default().timeout_secs),
        }
    }

    /// Creates a session, applies the configured timeout and performs the handshake
    pub async fn connect<S>(stream: S, config: &ClientConfig) -> SessionResult<Self>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let session = Self::new(stream);
        session.set_timeout(config.timeout_secs);

        let version = session.init().await?;
        debug!("listing session established, protocol version {}", version.version);

        Ok(session)
    }

    /// Set the maximum response time in seconds.
    /// Default: 10 seconds
    pub fn set_timeout(&self, secs: u64) {
        self.timeout.store(secs, Ordering::SeqCst);
    }

    /// Number of operation ids allocated through this session and not closed yet
    pub fn open_operations(&self) -> u64 {
        self.operations.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    async fn send(&self, request: Request) -> SessionResult<Response> {
        let timeout = Duration::from_secs(self.timeout.load(Ordering::SeqCst));
        self.send_with(request, Some(timeout)).await
    }

    async fn send_with(
        &self,
        request: Request,
        timeout: Option<Duration>,
    ) -> SessionResult<Response> {
        if self.tx.is_closed() {
            return Err(Error::UnexpectedBehavior("session closed".into()));
        }

        let id = request.request_id();
        let (tx, mut rx) = mpsc::channel(1);

        let _ = self.requests.pin().insert(id, tx);
        let _slot = PendingSlot {
            requests: &self.requests,
            id,
        };
        self.tx.send(Bytes::from(request))?;

        let received = match timeout {
            Some(timeout) => time::timeout(timeout, rx.recv()).await,
            None => Ok(rx.recv().await),
        };

        match received {
            Ok(Some(result)) => result,
            Ok(None) => Err(Error::UnexpectedBehavior("recv none message".into())),
            Err(error) => Err(error.into()),
        }
    }

    fn use_next_id(&self) -> u32 {
        self.next_req_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Closes the inner channel stream. Called by [`Drop`]
    pub fn close_session(&self) -> SessionResult<()> {
        if self.tx.is_closed() {
            return Ok(());
        }

        Ok(self.tx.send(Bytes::new())?)
    }

    pub async fn init(&self) -> SessionResult<Version> {
        let result = self.send(Init::new().into()).await?;
        into_with_status!(result, Version)
    }

    pub async fn make_opid(&self) -> SessionResult<Opid> {
        let id = self.use_next_id();
        let result = self.send(Request::MakeOpid(NoArgs { id })).await?;

        if let Response::Opid(_) = result {
            let _ = self.operations.fetch_add(1, Ordering::SeqCst);
        }

        into_with_status!(result, Opid)
    }

    pub async fn list<P: Into<String>>(&self, opid: OpId, path: P) -> SessionResult<Status> {
        let id = self.use_next_id();
        let result = self
            .send(Request::List(List {
                id,
                opid,
                path: path.into(),
            }))
            .await?;

        into_status!(result)
    }

    pub async fn list_recursive<P: Into<String>>(
        &self,
        opid: OpId,
        path: P,
    ) -> SessionResult<Status> {
        let id = self.use_next_id();
        let result = self
            .send(Request::ListRecursive(List {
                id,
                opid,
                path: path.into(),
            }))
            .await?;

        into_status!(result)
    }

    /// Waits for the job to finish. Not bounded by the request timeout
    pub async fn wait(&self, opid: OpId) -> SessionResult<Status> {
        let id = self.use_next_id();
        let result = self
            .send_with(Request::Wait(Opid { id, opid }), None)
            .await?;

        into_status!(result)
    }

    pub async fn read_list(&self, opid: OpId) -> SessionResult<ListResult> {
        let id = self.use_next_id();
        let result = self.send(Request::ReadList(Opid { id, opid })).await?;

        into_with_status!(result, ListResult)
    }

    pub async fn close(&self, opid: OpId) -> SessionResult<Status> {
        let id = self.use_next_id();
        let result = self.send(Request::Close(Opid { id, opid })).await?;

        if let Response::Status(status) = &result {
            if status.status_code == StatusCode::Ok
                && self
                    .operations
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |h| h.checked_sub(1))
                    .is_err()
            {
                warn!("attempt to close more operations than exist");
            }
        }

        into_status!(result)
    }

    pub async fn get_favorites(&self) -> SessionResult<Favorites> {
        let id = self.use_next_id();
        let result = self.send(Request::GetFavorites(NoArgs { id })).await?;

        into_with_status!(result, Favorites)
    }
}

#[async_trait]
impl RemoteFs for RawSession {
    async fn create_operation(&self) -> SessionResult<OpId> {
        Ok(self.make_opid().await?.opid)
    }

    async fn start_list(&self, opid: OpId, path: &str) -> SessionResult<()> {
        self.list(opid, path).await.map(|_| ())
    }

    async fn start_list_recursive(&self, opid: OpId, path: &str) -> SessionResult<()> {
        self.list_recursive(opid, path).await.map(|_| ())
    }

    async fn wait(&self, opid: OpId) -> SessionResult<()> {
        Self::wait(self, opid).await.map(|_| ())
    }

    async fn read_page(&self, opid: OpId) -> SessionResult<ResultPage> {
        self.read_list(opid).await.map(ResultPage::from)
    }

    async fn close(&self, opid: OpId) -> SessionResult<()> {
        Self::close(self, opid).await.map(|_| ())
    }

    async fn list_favorites(&self) -> SessionResult<Vec<FavoriteEntry>> {
        Ok(self.get_favorites().await?.folders)
    }
}

impl Drop for RawSession {
    fn drop(&mut self) {
        let _ = self.close_session();
    }
}
