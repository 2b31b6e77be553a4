use crate::{
    error::BotError,
    message::{Chat, ClientEvent, Contact, IncomingMessage},
};
use async_trait::async_trait;

/// Chat client trait: the connection to the messaging platform.
///
/// A client owns the transport and the authentication handshake. Once
/// initialized it reports everything that happens through the returned event
/// receiver; the gateway drives all replies through the remaining methods.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Human-readable client name.
    fn name(&self) -> &str;

    /// Connect and start emitting events.
    ///
    /// `session` is the blob previously delivered via
    /// [`ClientEvent::Authenticated`], if one was persisted. Without it the
    /// client falls back to QR-code pairing.
    async fn initialize(
        &self,
        session: Option<serde_json::Value>,
    ) -> Result<tokio::sync::mpsc::Receiver<ClientEvent>, BotError>;

    /// Resolve the chat a message was posted in.
    async fn chat(&self, message: &IncomingMessage) -> Result<Chat, BotError>;

    /// Resolve the contact that sent a message.
    async fn contact(&self, message: &IncomingMessage) -> Result<Contact, BotError>;

    /// Mark a chat as read.
    async fn send_seen(&self, chat: &Chat) -> Result<(), BotError>;

    /// Send a text message to a chat.
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<(), BotError>;

    /// Advertise the account as online.
    async fn send_presence_available(&self) -> Result<(), BotError> {
        Ok(())
    }
}
