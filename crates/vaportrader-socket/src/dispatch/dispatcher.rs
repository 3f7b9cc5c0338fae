use std::sync::Arc;

use vaportrader_core::protocol::{ChatMessage, Inbound};

use crate::dispatch::{Hooks, PrivateMessage};
use crate::pending::{Correlator, PendingTable};

/// Routes decoded inbound frames to the pending table or the registered hooks.
///
/// `dispatch` never awaits: hooks run on their own tasks so a slow hook cannot
/// stall the read loop.
pub struct Dispatcher {
    pending: Arc<PendingTable>,
    hooks: Arc<Hooks>,
    correlator: Correlator,
    reply_footer: Option<Arc<str>>,
}

impl Dispatcher {
    pub fn new(
        pending: Arc<PendingTable>,
        hooks: Arc<Hooks>,
        correlator: Correlator,
        reply_footer: Option<Arc<str>>,
    ) -> Self {
        Self {
            pending,
            hooks,
            correlator,
            reply_footer,
        }
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn dispatch(&self, inbound: Inbound) {
        match inbound {
            Inbound::MessageSent(ack) => {
                let temp_id = ack.temp_id.clone();
                if !self.pending.resolve(ack) {
                    // Already timed out, or sent by another session on the same account.
                    tracing::debug!(%temp_id, "acknowledgment for unknown temp id");
                }
            }
            Inbound::NewMessage(msg) => self.on_new_message(msg),
            Inbound::NewOrder { feed, order } => {
                if let Some(hook) = self.hooks.order() {
                    tracing::trace!(%feed, order_id = %order.id, "new order");
                    tokio::spawn(hook(*order));
                }
            }
            Inbound::OnlineCount(count) => {
                tracing::debug!(
                    total = count.total_users,
                    registered = count.registered_users,
                    "online count"
                );
            }
            Inbound::Unhandled { msg_type } => {
                tracing::debug!(%msg_type, "unhandled message type");
            }
        }
    }

    fn on_new_message(&self, msg: ChatMessage) {
        if let Some(hook) = self.hooks.private_message() {
            let correlator = self.correlator.clone();
            let pm = PrivateMessage::new(msg, correlator.clone(), self.reply_footer.clone());
            tokio::spawn(async move {
                if let Err(e) = correlator.mark_read(pm.message().id.clone()).await {
                    tracing::warn!(error = %e, chat_id = %pm.chat_id(), "read receipt not queued");
                }
                hook(pm).await;
            });
            return;
        }

        if let Some(hook) = self.hooks.new_message() {
            tokio::spawn(hook(msg));
        }
    }
}
