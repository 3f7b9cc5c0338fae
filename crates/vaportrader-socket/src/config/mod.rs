//! Client configuration.
//!
//! One YAML document with three sections: `socket` (endpoint, feeds, connect
//! timeout, queue depth, reply footer), `pending` (ack timeout and sweep
//! cadence for confirmed sends) and `reconnect` (backoff policy). Unknown keys
//! are rejected at every level and the result is range-checked before use.
//! The auth token never lives here.

pub mod schema;

use std::fs;

use vaportrader_core::error::{Result, VaporError};

pub use schema::{ClientConfig, PendingSection, ReconnectSection, SocketSection};

pub fn load_from_file(path: &str) -> Result<ClientConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| VaporError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ClientConfig> {
    let cfg: ClientConfig = serde_yaml::from_str(s)
        .map_err(|e| VaporError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
