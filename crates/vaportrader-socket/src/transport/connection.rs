use std::sync::{Arc, PoisonError, RwLock};

use futures_util::{SinkExt, Stream, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use vaportrader_core::error::{Result, VaporError};
use vaportrader_core::protocol::{Outbound, PresenceStatus};

use crate::config::ClientConfig;
use crate::dispatch::Dispatcher;
use crate::outbound::{run_writer, OutboundFrame, OutboundReceiver};
use crate::transport::codec::{self, Incoming};
use crate::transport::BackoffPolicy;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Socket lifecycle as seen by callers of `MarketClient::state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Why a read loop ended.
#[derive(Debug)]
enum ReadOutcome {
    Closed(Option<String>),
    Failed(WsError),
}

/// Tasks bound to one live socket.
struct Live {
    reader: JoinHandle<ReadOutcome>,
    writer: JoinHandle<()>,
}

impl Live {
    fn abort(&self) {
        self.reader.abort();
        self.writer.abort();
    }
}

/// Owns the socket: dial, handshake, read loop, writer handoff and reconnect.
pub struct ConnectionManager {
    endpoint: String,
    token: String,
    connect_timeout: Duration,
    backoff: BackoffPolicy,

    /// Re-sent on every connect, runtime subscriptions included.
    feeds: RwLock<Vec<String>>,
    /// Last status set by the user, re-applied on every connect.
    status: RwLock<PresenceStatus>,

    state: watch::Sender<ConnectionState>,
    dispatcher: Arc<Dispatcher>,
    outbound: OutboundReceiver,
    shutdown: watch::Receiver<bool>,
}

impl ConnectionManager {
    pub fn new(
        cfg: &ClientConfig,
        token: String,
        dispatcher: Arc<Dispatcher>,
        outbound: OutboundReceiver,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            endpoint: cfg.socket.endpoint.clone(),
            token,
            connect_timeout: cfg.socket.connect_timeout(),
            backoff: BackoffPolicy::from_config(&cfg.reconnect),
            feeds: RwLock::new(cfg.socket.feeds.clone()),
            status: RwLock::new(PresenceStatus::default()),
            state,
            dispatcher,
            outbound,
            shutdown,
        }
    }

    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn status(&self) -> PresenceStatus {
        *self.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn remember_status(&self, status: PresenceStatus) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }

    /// Returns false when the feed was already known.
    pub fn remember_feed(&self, feed: &str) -> bool {
        let mut feeds = self.feeds.write().unwrap_or_else(PoisonError::into_inner);
        if feeds.iter().any(|f| f == feed) {
            return false;
        }
        feeds.push(feed.to_string());
        true
    }

    pub fn feeds(&self) -> Vec<String> {
        self.feeds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// First connection. A failure here is returned to the caller; after it
    /// succeeds the supervisor task owns reconnects.
    pub async fn connect(self: Arc<Self>) -> Result<JoinHandle<()>> {
        let live = self.establish().await?;
        Ok(tokio::spawn(self.supervise(live)))
    }

    async fn supervise(self: Arc<Self>, mut live: Live) {
        let mut shutdown = self.shutdown.clone();
        loop {
            let outcome = tokio::select! {
                res = &mut live.reader => res,
                _ = shutdown_requested(&mut shutdown) => {
                    live.abort();
                    self.set_state(ConnectionState::Disconnected);
                    tracing::info!(endpoint = %self.endpoint, "connection closed on shutdown");
                    return;
                }
            };

            live.writer.abort();
            self.set_state(ConnectionState::Disconnected);
            match outcome {
                Ok(ReadOutcome::Closed(reason)) => {
                    tracing::warn!(endpoint = %self.endpoint, reason = ?reason, "socket closed by peer");
                }
                Ok(ReadOutcome::Failed(e)) => {
                    tracing::warn!(endpoint = %self.endpoint, error = %e, "socket read failed");
                }
                Err(e) => {
                    tracing::error!(endpoint = %self.endpoint, error = %e, "read loop task died");
                }
            }

            match self.reconnect(&mut shutdown).await {
                Some(next) => live = next,
                None => return,
            }
        }
    }

    async fn reconnect(&self, shutdown: &mut watch::Receiver<bool>) -> Option<Live> {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            if !self.backoff.allows(attempt) {
                tracing::error!(
                    endpoint = %self.endpoint,
                    attempts = attempt - 1,
                    "reconnect attempts exhausted, giving up"
                );
                return None;
            }

            let delay = self.backoff.delay_for_attempt(attempt);
            if !delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = shutdown_requested(shutdown) => return None,
                }
            }
            if *shutdown.borrow() {
                return None;
            }

            tokio::select! {
                res = self.establish() => match res {
                    Ok(live) => {
                        tracing::info!(endpoint = %self.endpoint, attempt, "reconnected");
                        return Some(live);
                    }
                    Err(e) => {
                        tracing::warn!(endpoint = %self.endpoint, attempt, error = %e, "reconnect failed");
                    }
                },
                _ = shutdown_requested(shutdown) => {
                    self.set_state(ConnectionState::Disconnected);
                    return None;
                }
            }
        }
    }

    /// Dial, write the handshake frames, then hand the socket halves to a
    /// fresh reader and writer.
    async fn establish(&self) -> Result<Live> {
        let handshake = self.handshake()?;
        self.set_state(ConnectionState::Connecting);

        let ws = match self.dial().await {
            Ok(ws) => ws,
            Err(e) => {
                self.set_state(ConnectionState::Disconnected);
                return Err(e);
            }
        };
        let (mut sink, stream) = ws.split();

        // Written ahead of the queue so they precede anything queued while offline.
        for frame in handshake {
            if let Err(e) = sink.send(Message::text(frame.text)).await {
                self.set_state(ConnectionState::Disconnected);
                return Err(VaporError::Connection(format!(
                    "handshake write failed ({}): {e}",
                    frame.msg_type
                )));
            }
        }

        self.set_state(ConnectionState::Connected);
        tracing::info!(endpoint = %self.endpoint, status = %self.status(), "connected");

        Ok(Live {
            reader: tokio::spawn(read_loop(stream, self.dispatcher.clone())),
            writer: tokio::spawn(run_writer(self.outbound.clone(), sink)),
        })
    }

    async fn dial(&self) -> Result<WsStream> {
        let mut request = self
            .endpoint
            .as_str()
            .into_client_request()
            .map_err(|e| VaporError::Connection(format!("bad endpoint: {e}")))?;
        let cookie = HeaderValue::from_str(&format!("JWT={}", self.token))
            .map_err(|_| VaporError::Connection("token is not a valid header value".into()))?;
        request.headers_mut().insert(COOKIE, cookie);

        tracing::debug!(endpoint = %self.endpoint, "dialing");
        match timeout(self.connect_timeout, connect_async(request)).await {
            Ok(Ok((ws, response))) => {
                tracing::debug!(status = %response.status(), "websocket handshake complete");
                Ok(ws)
            }
            Ok(Err(e)) => Err(VaporError::Connection(e.to_string())),
            Err(_) => Err(VaporError::Connection(format!(
                "connect timed out after {}ms",
                self.connect_timeout.as_millis()
            ))),
        }
    }

    /// Feed subscriptions, then invisible, then the remembered status.
    fn handshake(&self) -> Result<Vec<OutboundFrame>> {
        self.feeds()
            .into_iter()
            .map(Outbound::Subscribe)
            .chain([
                Outbound::SetStatus(PresenceStatus::Invisible),
                Outbound::SetStatus(self.status()),
            ])
            .map(|out| OutboundFrame::encode(&out))
            .collect()
    }

    fn set_state(&self, next: ConnectionState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            tracing::debug!(from = ?prev, to = ?next, "connection state");
        }
    }
}

/// Resolves once shutdown is signalled or the client holding the sender is gone.
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

async fn read_loop<S>(mut stream: S, dispatcher: Arc<Dispatcher>) -> ReadOutcome
where
    S: Stream<Item = std::result::Result<Message, WsError>> + Unpin,
{
    while let Some(item) = stream.next().await {
        let msg = match item {
            Ok(msg) => msg,
            Err(e) => return ReadOutcome::Failed(e),
        };
        match codec::decode(msg) {
            Ok(Incoming::Event(inbound)) => dispatcher.dispatch(inbound),
            Ok(Incoming::Ping | Incoming::Pong) => {}
            Ok(Incoming::Binary { bytes_len }) => {
                tracing::debug!(bytes_len, "binary frame ignored");
            }
            Ok(Incoming::Close { reason }) => return ReadOutcome::Closed(reason),
            Err(e) => {
                tracing::warn!(code = e.code().as_str(), error = %e, "inbound frame dropped");
            }
        }
    }
    ReadOutcome::Closed(None)
}
