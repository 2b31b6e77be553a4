use uuid::Uuid;

/// An incoming chat message.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Platform-specific chat ID the message arrived in.
    pub chat_id: String,
    /// Platform-specific sender ID.
    pub sender_id: String,
    /// Raw message body, as typed by the sender.
    pub body: String,
    /// Unix timestamp (seconds) assigned by the platform.
    pub timestamp: i64,
}

impl IncomingMessage {
    /// Build a message stamped with a fresh ID.
    pub fn new(chat_id: &str, sender_id: &str, body: &str, timestamp: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            chat_id: chat_id.to_string(),
            sender_id: sender_id.to_string(),
            body: body.to_string(),
            timestamp,
        }
    }
}

/// The chat a message belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: String,
    pub is_group: bool,
}

/// The contact that sent a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    /// Display name chosen by the contact. May be empty.
    pub push_name: String,
    /// Phone number without the server suffix.
    pub number: String,
}

/// Connection state reported by the chat client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientState {
    Connected,
    Opening,
    Pairing,
    Timeout,
    Conflict,
    Unpaired,
    Other(String),
}

impl ClientState {
    /// Parse a platform state name (e.g. `"TIMEOUT"`). Unknown names are kept verbatim.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "CONNECTED" => Self::Connected,
            "OPENING" => Self::Opening,
            "PAIRING" => Self::Pairing,
            "TIMEOUT" => Self::Timeout,
            "CONFLICT" => Self::Conflict,
            "UNPAIRED" => Self::Unpaired,
            _ => Self::Other(name.to_string()),
        }
    }
}

/// Lifecycle and message events emitted by a chat client.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A QR code must be scanned to pair this device.
    Qr(String),
    /// Authentication succeeded. Carries the opaque session blob to persist.
    Authenticated(serde_json::Value),
    /// Authentication with the stored session failed.
    AuthFailure(String),
    /// The client is ready to receive messages.
    Ready,
    /// A chat message arrived.
    Message(IncomingMessage),
    /// The connection state changed.
    StateChanged(ClientState),
    /// The client lost its connection.
    Disconnected(String),
}
