use std::borrow::Cow;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use vaportrader_core::error::{Result, VaporError};
use vaportrader_core::protocol::Outbound;

/// Pre-encoded text frame (serialize once, before queueing).
#[derive(Debug, Clone)]
pub struct OutboundFrame {
    pub msg_type: Cow<'static, str>,
    pub text: String,
}

impl OutboundFrame {
    /// Encoding errors surface here, to the caller, never inside the writer.
    pub fn encode(out: &Outbound) -> Result<Self> {
        Ok(Self {
            msg_type: out.msg_type(),
            text: out.encode()?,
        })
    }
}

/// Producer side. Cheap to clone.
#[derive(Clone)]
pub struct OutboundQueue {
    tx: mpsc::Sender<OutboundFrame>,
}

/// Consumer side, handed from one connection's writer to the next.
#[derive(Clone)]
pub struct OutboundReceiver {
    inner: Arc<Mutex<mpsc::Receiver<OutboundFrame>>>,
}

impl OutboundQueue {
    pub fn new(capacity: usize) -> (Self, OutboundReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self { tx },
            OutboundReceiver {
                inner: Arc::new(Mutex::new(rx)),
            },
        )
    }

    /// Encode and enqueue. Waits for room when the queue is full.
    pub async fn push(&self, out: &Outbound) -> Result<()> {
        self.push_frame(OutboundFrame::encode(out)?).await
    }

    pub async fn push_frame(&self, frame: OutboundFrame) -> Result<()> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| VaporError::QueueClosed)
    }
}

impl OutboundReceiver {
    /// Exclusive access for a writer task. Held for the writer's lifetime.
    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, mpsc::Receiver<OutboundFrame>> {
        self.inner.lock().await
    }

    #[cfg(test)]
    pub(crate) async fn recv(&self) -> Option<OutboundFrame> {
        self.inner.lock().await.recv().await
    }
}
