//! Outbound messages and their envelope encoding.

use std::borrow::Cow;

use crate::error::Result;
use crate::protocol::envelope::OutgoingEnvelope;
use crate::protocol::payload::{PresenceStatus, ReadMessage, SendMessage};
use crate::protocol::{MESSAGE_WAS_READ, SEND_MESSAGE, SET_STATUS, SUBSCRIBE_PREFIX};

/// Every message this client writes to the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    SetStatus(PresenceStatus),
    /// Feed name, e.g. `MOST_RECENT`. Carries no payload.
    Subscribe(String),
    SendMessage(SendMessage),
    MessageWasRead(ReadMessage),
}

impl Outbound {
    pub fn msg_type(&self) -> Cow<'static, str> {
        match self {
            Outbound::SetStatus(_) => Cow::Borrowed(SET_STATUS),
            Outbound::Subscribe(feed) => Cow::Owned(format!("{SUBSCRIBE_PREFIX}{feed}")),
            Outbound::SendMessage(_) => Cow::Borrowed(SEND_MESSAGE),
            Outbound::MessageWasRead(_) => Cow::Borrowed(MESSAGE_WAS_READ),
        }
    }

    /// Serialize once into the text frame written to the socket.
    pub fn encode(&self) -> Result<String> {
        let ty = self.msg_type();
        match self {
            Outbound::SetStatus(status) => envelope(&ty, Some(status)),
            Outbound::Subscribe(_) => envelope::<()>(&ty, None),
            Outbound::SendMessage(m) => envelope(&ty, Some(m)),
            Outbound::MessageWasRead(r) => envelope(&ty, Some(r)),
        }
    }
}

fn envelope<T: serde::Serialize>(msg_type: &str, payload: Option<&T>) -> Result<String> {
    OutgoingEnvelope { msg_type, payload }.encode()
}
