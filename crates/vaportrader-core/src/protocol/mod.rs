//! Market socket wire protocol.
//!
//! Every frame in both directions is a JSON envelope `{"type", "payload"}`.
//! `type` is a namespaced discriminator (`@WS/chats/NEW_MESSAGE`); the payload
//! shape depends on it. Inbound frames are parsed in two stages: the envelope
//! keeps `payload` as `RawValue`, then `Inbound` picks the concrete shape from
//! a type table. Malformed input is reported as `VaporError::Decode`.

pub mod envelope;
pub mod inbound;
pub mod outbound;
pub mod payload;

pub use envelope::{Envelope, OutgoingEnvelope};
pub use inbound::{Inbound, InboundKind};
pub use outbound::Outbound;
pub use payload::{
    Acknowledgment, ChatMessage, MessageSent, NewOrder, OnlineCount, Order, OrderType,
    PlatformItem, PlatformUser, PresenceStatus, ReadMessage, SendMessage,
};

/// Outbound: set the account's presence.
pub const SET_STATUS: &str = "@WS/USER/SET_STATUS";
/// Outbound: subscribe to a live feed (`@WS/SUBSCRIBE/<feed>`).
pub const SUBSCRIBE_PREFIX: &str = "@WS/SUBSCRIBE/";
/// Outbound: send a direct message.
pub const SEND_MESSAGE: &str = "@WS/chats/SEND_MESSAGE";
/// Outbound: read receipt for a direct message.
pub const MESSAGE_WAS_READ: &str = "@WS/chats/MESSAGE_WAS_READ";

/// Inbound: delivery acknowledgment for `SEND_MESSAGE`.
pub const MESSAGE_SENT: &str = "@WS/chats/MESSAGE_SENT";
/// Inbound: a new direct message.
pub const NEW_MESSAGE: &str = "@WS/chats/NEW_MESSAGE";
/// Inbound: `@WS/SUBSCRIPTIONS/<feed>/NEW_ORDER`.
pub const SUBSCRIPTIONS_PREFIX: &str = "@WS/SUBSCRIPTIONS/";
pub const NEW_ORDER_SUFFIX: &str = "/NEW_ORDER";
/// Inbound: site-wide online counter.
pub const ONLINE_COUNT: &str = "@WS/MESSAGE/ONLINE_COUNT";
