use std::time::Duration;

use serde::Deserialize;
use vaportrader_core::error::{Result, VaporError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub socket: SocketSection,

    #[serde(default)]
    pub pending: PendingSection,

    #[serde(default)]
    pub reconnect: ReconnectSection,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(VaporError::UnsupportedVersion);
        }

        self.socket.validate()?;
        self.pending.validate()?;
        self.reconnect.validate()?;

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: 1,
            socket: SocketSection::default(),
            pending: PendingSection::default(),
            reconnect: ReconnectSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SocketSection {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Feeds subscribed on every (re)connect.
    #[serde(default = "default_feeds")]
    pub feeds: Vec<String>,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,

    /// Appended to every `PrivateMessage::reply`.
    #[serde(default)]
    pub reply_footer: Option<String>,
}

impl Default for SocketSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            feeds: default_feeds(),
            connect_timeout_ms: default_connect_timeout_ms(),
            outbound_capacity: default_outbound_capacity(),
            reply_footer: None,
        }
    }
}

impl SocketSection {
    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("wss://") || self.endpoint.starts_with("ws://")) {
            return Err(VaporError::BadRequest(
                "socket.endpoint must be a ws:// or wss:// url".into(),
            ));
        }
        if self.feeds.iter().any(|f| f.is_empty() || f.contains('/')) {
            return Err(VaporError::BadRequest(
                "socket.feeds entries must be non-empty and contain no '/'".into(),
            ));
        }
        if !(1000..=60000).contains(&self.connect_timeout_ms) {
            return Err(VaporError::BadRequest(
                "socket.connect_timeout_ms must be between 1000 and 60000".into(),
            ));
        }
        if !(1..=65536).contains(&self.outbound_capacity) {
            return Err(VaporError::BadRequest(
                "socket.outbound_capacity must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

fn default_endpoint() -> String {
    "wss://warframe.market/socket?platform=pc".into()
}
fn default_feeds() -> Vec<String> {
    vec!["MOST_RECENT".into()]
}
fn default_connect_timeout_ms() -> u64 {
    10000
}
fn default_outbound_capacity() -> usize {
    256
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PendingSection {
    /// A confirmed send older than this resolves negatively.
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,

    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

impl Default for PendingSection {
    fn default() -> Self {
        Self {
            ack_timeout_ms: default_ack_timeout_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

impl PendingSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=60000).contains(&self.ack_timeout_ms) {
            return Err(VaporError::BadRequest(
                "pending.ack_timeout_ms must be between 100 and 60000".into(),
            ));
        }
        if !(10..=10000).contains(&self.sweep_interval_ms) {
            return Err(VaporError::BadRequest(
                "pending.sweep_interval_ms must be between 10 and 10000".into(),
            ));
        }
        if self.sweep_interval_ms >= self.ack_timeout_ms {
            return Err(VaporError::BadRequest(
                "pending.sweep_interval_ms must be less than ack_timeout_ms".into(),
            ));
        }
        Ok(())
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

fn default_ack_timeout_ms() -> u64 {
    5000
}
fn default_sweep_interval_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectSection {
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// 0 = retry forever.
    #[serde(default)]
    pub max_attempts: u32,
}

impl Default for ReconnectSection {
    fn default() -> Self {
        Self {
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
            max_attempts: 0,
        }
    }
}

impl ReconnectSection {
    pub fn validate(&self) -> Result<()> {
        if !(10..=60000).contains(&self.initial_backoff_ms) {
            return Err(VaporError::BadRequest(
                "reconnect.initial_backoff_ms must be between 10 and 60000".into(),
            ));
        }
        if self.max_backoff_ms < self.initial_backoff_ms || self.max_backoff_ms > 600000 {
            return Err(VaporError::BadRequest(
                "reconnect.max_backoff_ms must be between initial_backoff_ms and 600000".into(),
            ));
        }
        if !(1.0..=10.0).contains(&self.multiplier) {
            return Err(VaporError::BadRequest(
                "reconnect.multiplier must be between 1.0 and 10.0".into(),
            ));
        }
        Ok(())
    }
}

fn default_initial_backoff_ms() -> u64 {
    500
}
fn default_max_backoff_ms() -> u64 {
    30000
}
fn default_multiplier() -> f64 {
    2.0
}
