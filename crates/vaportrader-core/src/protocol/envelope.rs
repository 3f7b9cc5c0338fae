//! Envelope (JSON) in both directions.
//!
//! Inbound envelopes store `payload` as `RawValue` so the dispatcher only pays
//! for decoding the payloads it actually routes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{Result, VaporError};

/// Inbound envelope (text frame).
#[derive(Debug, Deserialize)]
pub struct Envelope {
    /// Message type (field name is `type` in JSON).
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Payload, stored as raw JSON (lazy parsing). `null` and absent are both `None`.
    #[serde(default)]
    pub payload: Option<Box<RawValue>>,
}

impl Envelope {
    /// Stage one: parse the envelope and keep the payload raw.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| VaporError::Decode(format!("invalid envelope json: {e}")))
    }

    /// Stage two: decode the payload into the shape selected by the caller.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        let raw = self.payload.as_ref().ok_or_else(|| {
            VaporError::Decode(format!("{} requires a payload", self.msg_type))
        })?;
        serde_json::from_str(raw.get())
            .map_err(|e| VaporError::Decode(format!("{} invalid payload: {e}", self.msg_type)))
    }
}

/// Outbound envelope. `payload` is omitted entirely when `None`.
#[derive(Debug, Serialize)]
pub struct OutgoingEnvelope<'a, T: Serialize> {
    #[serde(rename = "type")]
    pub msg_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<&'a T>,
}

impl<'a, T: Serialize> OutgoingEnvelope<'a, T> {
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| VaporError::Encode(e.to_string()))
    }
}
