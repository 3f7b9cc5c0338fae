//! Inbound classification: envelope `type` -> concrete payload variant.

use serde::Deserialize;

use crate::error::{Result, VaporError};
use crate::protocol::envelope::Envelope;
use crate::protocol::payload::{Acknowledgment, ChatMessage, MessageSent, NewOrder, OnlineCount, Order};
use crate::protocol::{
    MESSAGE_SENT, NEW_MESSAGE, NEW_ORDER_SUFFIX, ONLINE_COUNT, SUBSCRIPTIONS_PREFIX,
};

/// Payload shape selected by the envelope type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundKind {
    MessageSent,
    NewMessage,
    NewOrder,
    OnlineCount,
}

/// Exact-match part of the type table. Feed-scoped types are matched in `classify`.
const TYPE_TABLE: &[(&str, InboundKind)] = &[
    (MESSAGE_SENT, InboundKind::MessageSent),
    (NEW_MESSAGE, InboundKind::NewMessage),
    (ONLINE_COUNT, InboundKind::OnlineCount),
];

impl InboundKind {
    pub fn classify(msg_type: &str) -> Option<Self> {
        if let Some((_, kind)) = TYPE_TABLE.iter().find(|(t, _)| *t == msg_type) {
            return Some(*kind);
        }
        order_feed(msg_type).map(|_| InboundKind::NewOrder)
    }
}

/// `@WS/SUBSCRIPTIONS/<feed>/NEW_ORDER` -> `<feed>`.
fn order_feed(msg_type: &str) -> Option<&str> {
    let feed = msg_type
        .strip_prefix(SUBSCRIPTIONS_PREFIX)?
        .strip_suffix(NEW_ORDER_SUFFIX)?;
    if feed.is_empty() || feed.contains('/') {
        return None;
    }
    Some(feed)
}

/// A fully decoded inbound frame.
#[derive(Debug, Clone)]
pub enum Inbound {
    /// Delivery acknowledgment. `success` is false when only the temp id could be read.
    MessageSent(Acknowledgment),
    NewMessage(ChatMessage),
    NewOrder { feed: String, order: Box<Order> },
    OnlineCount(OnlineCount),
    /// Well-formed envelope of a type we do not route.
    Unhandled { msg_type: String },
}

#[derive(Deserialize)]
struct TempIdOnly {
    temp_id: String,
}

impl Inbound {
    /// Parse a text frame (both stages).
    pub fn decode(text: &str) -> Result<Self> {
        Self::from_envelope(Envelope::parse(text)?)
    }

    /// Stage two: decode the payload according to the type table.
    pub fn from_envelope(env: Envelope) -> Result<Self> {
        let Some(kind) = InboundKind::classify(&env.msg_type) else {
            return Ok(Inbound::Unhandled {
                msg_type: env.msg_type,
            });
        };

        match kind {
            InboundKind::MessageSent => match env.payload_as::<MessageSent>() {
                Ok(sent) => Ok(Inbound::MessageSent(Acknowledgment::delivered(sent))),
                Err(full_err) => {
                    // Partial read: resolve the waiter negatively rather than leave it to time out.
                    let partial: TempIdOnly = env.payload_as().map_err(|_| full_err)?;
                    Ok(Inbound::MessageSent(Acknowledgment::failed(partial.temp_id)))
                }
            },
            InboundKind::NewMessage => Ok(Inbound::NewMessage(env.payload_as()?)),
            InboundKind::NewOrder => {
                let wrapped: NewOrder = env.payload_as()?;
                let feed = order_feed(&env.msg_type)
                    .ok_or_else(|| VaporError::Internal("order type lost its feed".into()))?
                    .to_string();
                Ok(Inbound::NewOrder {
                    feed,
                    order: Box::new(wrapped.order),
                })
            }
            InboundKind::OnlineCount => Ok(Inbound::OnlineCount(env.payload_as()?)),
        }
    }

    /// Envelope type this frame was classified from (for logs).
    pub fn kind(&self) -> Option<InboundKind> {
        match self {
            Inbound::MessageSent(_) => Some(InboundKind::MessageSent),
            Inbound::NewMessage(_) => Some(InboundKind::NewMessage),
            Inbound::NewOrder { .. } => Some(InboundKind::NewOrder),
            Inbound::OnlineCount(_) => Some(InboundKind::OnlineCount),
            Inbound::Unhandled { .. } => None,
        }
    }
}
