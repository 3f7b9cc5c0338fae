//! Decode-once codec for websocket messages.
//!
//! - Text frames => `Inbound` (two-stage envelope parse)
//! - Ping/Pong/Close are surfaced for lifecycle management
//! - Binary frames are not part of the market protocol

use tokio_tungstenite::tungstenite::Message;
use vaportrader_core::{error::Result, protocol::Inbound};

#[derive(Debug)]
pub enum Incoming {
    Event(Inbound),
    Ping,
    Pong,
    Binary { bytes_len: usize },
    Close { reason: Option<String> },
}

pub fn decode(msg: Message) -> Result<Incoming> {
    match msg {
        Message::Text(s) => Ok(Incoming::Event(Inbound::decode(s.as_str())?)),
        Message::Binary(b) => Ok(Incoming::Binary { bytes_len: b.len() }),
        // tungstenite queues the pong itself.
        Message::Ping(_) => Ok(Incoming::Ping),
        Message::Pong(_) => Ok(Incoming::Pong),
        Message::Close(frame) => Ok(Incoming::Close {
            reason: frame.map(|f| format!("{} {}", u16::from(f.code), f.reason.as_str())),
        }),
        // Raw frames only exist on the write path.
        Message::Frame(f) => Ok(Incoming::Binary { bytes_len: f.len() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_text_is_decode_error() {
        let err = decode(Message::text("{not json")).unwrap_err();
        assert_eq!(err.code().as_str(), "DECODE");
    }

    #[test]
    fn unknown_type_is_still_an_event() {
        match decode(Message::text(r#"{"type":"@WS/chats/TYPING"}"#)).unwrap() {
            Incoming::Event(Inbound::Unhandled { msg_type }) => assert_eq!(msg_type, "@WS/chats/TYPING"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
