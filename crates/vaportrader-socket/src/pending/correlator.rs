use std::sync::Arc;

use tokio::time::Duration;

use vaportrader_core::error::{Result, VaporError};
use vaportrader_core::protocol::{Acknowledgment, Outbound, ReadMessage, SendMessage};

use crate::outbound::{OutboundFrame, OutboundQueue};
use crate::pending::PendingTable;

/// Fresh correlation token for a chat message.
pub fn new_temp_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Request/reply over the fire-and-forget socket.
///
/// Cheap to clone; every clone shares the same pending table and queue.
///
/// Every confirmed send is bounded by `ack_timeout`, measured from the call,
/// whether or not a connection or a sweeper exists and even while the queue
/// is full.
#[derive(Clone)]
pub struct Correlator {
    table: Arc<PendingTable>,
    queue: OutboundQueue,
    ack_timeout: Duration,
}

impl Correlator {
    pub fn new(table: Arc<PendingTable>, queue: OutboundQueue, ack_timeout: Duration) -> Self {
        Self {
            table,
            queue,
            ack_timeout,
        }
    }

    /// Send a chat message and wait for the market to confirm it.
    ///
    /// Returns a negative `Acknowledgment` (not an error) when no confirmation
    /// arrives within the ack timeout. Errors are reserved for failures before
    /// the frame is queued.
    pub async fn send_with_confirmation(
        &self,
        message: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Result<Acknowledgment> {
        self.send_with_temp_id(message, chat_id, new_temp_id()).await
    }

    /// Same as `send_with_confirmation` with a caller-chosen temp id, which
    /// must not be pending already.
    pub async fn send_with_temp_id(
        &self,
        message: impl Into<String>,
        chat_id: impl Into<String>,
        temp_id: impl Into<String>,
    ) -> Result<Acknowledgment> {
        let temp_id = temp_id.into();
        let frame = OutboundFrame::encode(&Outbound::SendMessage(SendMessage {
            chat_id: chat_id.into(),
            message: message.into(),
            temp_id: temp_id.clone(),
        }))?;

        let rx = self.table.register(&temp_id)?;
        let deliver = async {
            self.queue.push_frame(frame).await?;
            Ok::<_, VaporError>(rx.await)
        };

        match tokio::time::timeout(self.ack_timeout, deliver).await {
            Ok(Ok(Ok(ack))) => Ok(ack),
            // Sender dropped without resolving: the table went away with the client.
            Ok(Ok(Err(_))) => Ok(Acknowledgment::failed(temp_id)),
            Ok(Err(e)) => {
                self.table.cancel(&temp_id);
                Err(e)
            }
            Err(_) => {
                // Queue full or no ack yet; the sweeper may already have taken the entry.
                self.table.cancel(&temp_id);
                tracing::debug!(%temp_id, "confirmed send timed out");
                Ok(Acknowledgment::failed(temp_id))
            }
        }
    }

    /// Read receipt for `message_id`. Fire-and-forget.
    pub async fn mark_read(&self, message_id: impl Into<String>) -> Result<()> {
        self.queue
            .push(&Outbound::MessageWasRead(ReadMessage {
                message_id: message_id.into(),
            }))
            .await
    }

    pub fn queue(&self) -> &OutboundQueue {
        &self.queue
    }

    pub fn pending(&self) -> &PendingTable {
        &self.table
    }
}
