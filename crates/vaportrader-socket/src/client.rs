//! `MarketClient`: the one handle applications hold.
//!
//! Wires config, pending table, hooks, dispatcher and connection manager
//! together. Cheap to clone; clones share one socket. Several independent
//! clients may coexist in a process.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use vaportrader_core::error::{Result, VaporError};
use vaportrader_core::protocol::{Acknowledgment, ChatMessage, Order, Outbound, PresenceStatus};

use crate::config::ClientConfig;
use crate::dispatch::{Dispatcher, Hooks, PrivateMessage};
use crate::outbound::OutboundQueue;
use crate::pending::{spawn_sweeper, Correlator, PendingTable};
use crate::transport::{ConnectionManager, ConnectionState};

#[derive(Clone)]
pub struct MarketClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    cfg: ClientConfig,
    pending: Arc<PendingTable>,
    hooks: Arc<Hooks>,
    correlator: Correlator,
    manager: Arc<ConnectionManager>,
    shutdown: watch::Sender<bool>,
    started: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl MarketClient {
    /// Build a client. Nothing is dialed until `connect`.
    pub fn new(cfg: ClientConfig, token: impl Into<String>) -> Result<Self> {
        cfg.validate()?;
        let token = token.into();
        if token.is_empty() {
            return Err(VaporError::BadRequest("token must not be empty".into()));
        }

        let pending = Arc::new(PendingTable::new());
        let hooks = Arc::new(Hooks::new());
        let (queue, outbound_rx) = OutboundQueue::new(cfg.socket.outbound_capacity);
        let correlator = Correlator::new(pending.clone(), queue, cfg.pending.ack_timeout());
        let (shutdown, shutdown_rx) = watch::channel(false);

        let dispatcher = Arc::new(Dispatcher::new(
            pending.clone(),
            hooks.clone(),
            correlator.clone(),
            cfg.socket.reply_footer.as_deref().map(Arc::from),
        ));
        let manager = Arc::new(ConnectionManager::new(
            &cfg,
            token,
            dispatcher,
            outbound_rx,
            shutdown_rx,
        ));

        Ok(Self {
            inner: Arc::new(ClientInner {
                cfg,
                pending,
                hooks,
                correlator,
                manager,
                shutdown,
                started: AtomicBool::new(false),
                tasks: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Dial the market, subscribe the configured feeds and start the
    /// background tasks. A failed first dial is returned as
    /// `VaporError::Connection` and may be retried.
    pub async fn connect(&self) -> Result<()> {
        let inner = &self.inner;
        if *inner.shutdown.borrow() {
            return Err(VaporError::QueueClosed);
        }
        if inner.started.swap(true, Ordering::SeqCst) {
            return Err(VaporError::BadRequest("client is already connected".into()));
        }

        let supervisor = match inner.manager.clone().connect().await {
            Ok(handle) => handle,
            Err(e) => {
                inner.started.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };
        let sweeper = spawn_sweeper(
            inner.pending.clone(),
            inner.cfg.pending.ack_timeout(),
            inner.cfg.pending.sweep_interval(),
            inner.shutdown.subscribe(),
        );

        inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend([supervisor, sweeper]);
        Ok(())
    }

    /// Stop the supervisor, socket tasks and sweeper, then fail whatever is
    /// still waiting for an acknowledgment. Idempotent.
    pub async fn shutdown(&self) {
        self.inner.shutdown.send_replace(true);

        let tasks = std::mem::take(&mut *self.inner.tasks.lock().unwrap_or_else(PoisonError::into_inner));
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "background task ended abnormally");
            }
        }

        let failed = self.inner.pending.fail_all();
        if failed > 0 {
            tracing::info!(failed, "pending sends failed on shutdown");
        }
    }

    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.manager.state()
    }

    /// Last status set through `set_status` (online until then).
    pub fn status(&self) -> PresenceStatus {
        self.inner.manager.status()
    }

    /// Remembered and re-applied on every reconnect.
    pub async fn set_status(&self, status: PresenceStatus) -> Result<()> {
        self.inner.manager.remember_status(status);
        self.inner
            .correlator
            .queue()
            .push(&Outbound::SetStatus(status))
            .await
    }

    /// Subscribe to an extra feed. Re-sent on every reconnect.
    pub async fn subscribe(&self, feed: &str) -> Result<()> {
        if feed.is_empty() || feed.contains('/') {
            return Err(VaporError::BadRequest(format!("invalid feed name: {feed:?}")));
        }
        self.inner.manager.remember_feed(feed);
        self.inner
            .correlator
            .queue()
            .push(&Outbound::Subscribe(feed.to_string()))
            .await
    }

    pub async fn send_with_confirmation(
        &self,
        message: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Result<Acknowledgment> {
        self.inner.correlator.send_with_confirmation(message, chat_id).await
    }

    pub async fn send_with_temp_id(
        &self,
        message: impl Into<String>,
        chat_id: impl Into<String>,
        temp_id: impl Into<String>,
    ) -> Result<Acknowledgment> {
        self.inner
            .correlator
            .send_with_temp_id(message, chat_id, temp_id)
            .await
    }

    pub async fn mark_read(&self, message_id: impl Into<String>) -> Result<()> {
        self.inner.correlator.mark_read(message_id).await
    }

    pub fn set_order_hook<F, Fut>(&self, hook: F)
    where
        F: Fn(Order) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.inner.hooks.set_order(hook);
    }

    /// Sees direct messages only while no private-message hook is set.
    pub fn set_new_message_hook<F, Fut>(&self, hook: F)
    where
        F: Fn(ChatMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.inner.hooks.set_new_message(hook);
    }

    pub fn set_private_message_hook<F, Fut>(&self, hook: F)
    where
        F: Fn(PrivateMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.inner.hooks.set_private_message(hook);
    }

    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.cfg
    }
}
