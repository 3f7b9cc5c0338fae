//! Concrete payload shapes behind each message type.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Account visibility advertised to the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    #[default]
    Online,
    Invisible,
    /// "Unknown / in activity". The wire value is `ingame`.
    #[serde(rename = "ingame")]
    InGame,
}

impl PresenceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PresenceStatus::Online => "online",
            PresenceStatus::Invisible => "invisible",
            PresenceStatus::InGame => "ingame",
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Sell,
    Buy,
    Trade,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderType::Sell => "sell",
            OrderType::Buy => "buy",
            OrderType::Trade => "trade",
        })
    }
}

// --------------------
// Direct messages
// --------------------

/// `@WS/chats/SEND_MESSAGE` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessage {
    /// Chat to post into.
    pub chat_id: String,
    pub message: String,
    /// Correlation token echoed back in `MESSAGE_SENT`.
    pub temp_id: String,
}

/// `@WS/chats/MESSAGE_WAS_READ` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadMessage {
    pub message_id: String,
}

/// A chat message as the market reports it (`NEW_MESSAGE`, and echoed in `MESSAGE_SENT`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// HTML-formatted text.
    #[serde(default)]
    pub message: String,
    /// Text as typed by the sender.
    #[serde(default)]
    pub raw_message: String,
    /// Sender's market user id.
    pub message_from: String,
    #[serde(default)]
    pub send_date: String,
    pub id: String,
    pub chat_id: String,
}

/// `@WS/chats/MESSAGE_SENT` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageSent {
    pub temp_id: String,
    #[serde(default)]
    pub message: Option<ChatMessage>,
}

/// Outcome of a confirmed send, delivered exactly once to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgment {
    pub temp_id: String,
    pub success: bool,
    /// The message as stored by the market; `None` on failure.
    pub message: Option<ChatMessage>,
}

impl Acknowledgment {
    pub fn delivered(sent: MessageSent) -> Self {
        Self {
            temp_id: sent.temp_id,
            success: true,
            message: sent.message,
        }
    }

    /// Negative outcome: timed out, or an acknowledgment we could only partly read.
    pub fn failed(temp_id: impl Into<String>) -> Self {
        Self {
            temp_id: temp_id.into(),
            success: false,
            message: None,
        }
    }
}

// --------------------
// Order feed
// --------------------

/// `@WS/SUBSCRIPTIONS/<feed>/NEW_ORDER` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub order: Order,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub creation_date: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    /// Only present for mods.
    #[serde(default)]
    pub mod_rank: Option<u32>,
    /// Price in platinum.
    pub platinum: u64,
    pub order_type: OrderType,
    pub quantity: u32,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub platform: String,
    pub user: PlatformUser,
    pub item: PlatformItem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformUser {
    pub id: String,
    pub ingame_name: String,
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reputation: i64,
    #[serde(default)]
    pub region: String,
    /// `online`, `offline` or `ingame`.
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformItem {
    pub id: String,
    pub url_name: String,
    #[serde(default)]
    pub thumb: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub sub_icon: Option<String>,
    #[serde(default)]
    pub icon_format: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub mod_max_rank: Option<u32>,
    /// Per-locale blocks (`en`, `ru`, `zh-hant`, ...), each carrying `item_name`.
    #[serde(flatten)]
    pub locales: BTreeMap<String, Value>,
}

impl PlatformItem {
    /// Localized item name, if the market sent one for `locale`.
    pub fn item_name(&self, locale: &str) -> Option<&str> {
        self.locales.get(locale)?.get("item_name")?.as_str()
    }
}

/// `@WS/MESSAGE/ONLINE_COUNT` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OnlineCount {
    pub total_users: u64,
    pub registered_users: u64,
}
