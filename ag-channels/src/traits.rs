use crate::types::{ChatId, ContactProfile, InteractiveMessage, MessageId, OutboundText};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send plain text into a chat. Delivery is best-effort; callers decide
    /// whether a failure aborts their flow.
    async fn send_text(&self, chat_id: &ChatId, message: OutboundText) -> Result<()>;

    /// Send an interactive button message and return the id the transport
    /// assigned to it. The id is only known post-send, which is why context
    /// registration happens in the caller.
    async fn send_interactive(
        &self,
        chat_id: &ChatId,
        message: InteractiveMessage,
    ) -> Result<MessageId>;

    /// Look up a contact's profile by JID. `None` when the transport does
    /// not know the contact.
    async fn contact_profile(&self, jid: &str) -> Result<Option<ContactProfile>> {
        let _ = jid;
        Ok(None)
    }

    /// Whether the underlying client session is up and able to send.
    async fn ready(&self) -> bool {
        true
    }
}
