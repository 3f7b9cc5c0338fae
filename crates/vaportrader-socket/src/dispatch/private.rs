use std::sync::Arc;

use vaportrader_core::error::Result;
use vaportrader_core::protocol::{Acknowledgment, ChatMessage};

use crate::collab::{ProfileLookup, UserDirectory, UserRecord};
use crate::pending::Correlator;

/// A direct message handed to the private-message hook, already marked read.
///
/// Carries its own handle back to the socket so hooks can answer without a
/// global client.
#[derive(Clone)]
pub struct PrivateMessage {
    inner: ChatMessage,
    correlator: Correlator,
    footer: Option<Arc<str>>,
}

impl PrivateMessage {
    pub fn new(inner: ChatMessage, correlator: Correlator, footer: Option<Arc<str>>) -> Self {
        Self {
            inner,
            correlator,
            footer,
        }
    }

    /// Text as typed by the sender.
    pub fn text(&self) -> &str {
        &self.inner.raw_message
    }

    /// Sender's market user id.
    pub fn author(&self) -> &str {
        &self.inner.message_from
    }

    pub fn chat_id(&self) -> &str {
        &self.inner.chat_id
    }

    pub fn message(&self) -> &ChatMessage {
        &self.inner
    }

    /// Confirmed reply into the same chat, footer appended when configured.
    pub async fn reply(&self, text: &str) -> Result<Acknowledgment> {
        let body = match &self.footer {
            Some(footer) => format!("{text}\n\n{footer}"),
            None => text.to_string(),
        };
        self.correlator
            .send_with_confirmation(body, self.inner.chat_id.clone())
            .await
    }

    /// Queue another read receipt for this message.
    pub async fn acknowledge(&self) -> Result<()> {
        self.correlator.mark_read(self.inner.id.clone()).await
    }

    /// Local account linked to the sender, if any.
    pub async fn sender(&self, users: &dyn UserDirectory) -> Result<Option<UserRecord>> {
        users.user_by_external_id(self.author()).await
    }

    /// Whether the sender owns the market account `username`.
    pub async fn is_from_owner_of(&self, profiles: &dyn ProfileLookup, username: &str) -> Result<bool> {
        Ok(profiles
            .profile_by_username(username)
            .await?
            .is_some_and(|p| p.id == self.author()))
    }
}

impl std::fmt::Debug for PrivateMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateMessage")
            .field("author", &self.author())
            .field("chat_id", &self.chat_id())
            .field("text", &self.text())
            .finish()
    }
}
