//! Console client: stdin/stdout stand-in for the chat platform.
//!
//! Every line typed on stdin arrives as a message from one local contact.
//! Replies are printed to stdout. A few slash commands drive the lifecycle:
//!
//! - `/group <text>` posts `<text>` in a group chat instead of the direct chat
//! - `/state <NAME>` reports a connection state change (e.g. `/state TIMEOUT`)
//! - `/quit` disconnects


use async_trait::async_trait;
use thunderbot_core::{
    error::BotError,
    message::{Chat, ClientEvent, ClientState, Contact, IncomingMessage},
    traits::ChatClient,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Chat ID suffix for direct chats.
const DIRECT_SUFFIX: &str = "@c.us";
/// Chat ID suffix for group chats.
const GROUP_SUFFIX: &str = "@g.us";
/// Chat ID used for `/group` messages.
const GROUP_CHAT_ID: &str = "console-group@g.us";

/// One parsed line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConsoleInput {
    Message { group: bool, body: String },
    State(ClientState),
    Quit,
}

/// Parse a line typed on the console. Blank lines yield `None`.
pub(crate) fn parse_line(line: &str) -> Option<ConsoleInput> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }

    if matches!(line.trim(), "/quit" | "/exit") {
        return Some(ConsoleInput::Quit);
    }

    if let Some(body) = line.strip_prefix("/group ") {
        return Some(ConsoleInput::Message {
            group: true,
            body: body.to_string(),
        });
    }

    if let Some(name) = line.strip_prefix("/state ") {
        return Some(ConsoleInput::State(ClientState::from_name(name.trim())));
    }

    Some(ConsoleInput::Message {
        group: false,
        body: line.to_string(),
    })
}

/// Console chat client.
pub struct ConsoleClient {
    contact: Contact,
}

impl ConsoleClient {
    /// Create a console client whose messages appear to come from `push_name` / `number`.
    pub fn new(push_name: &str, number: &str) -> Self {
        Self {
            contact: Contact {
                push_name: push_name.to_string(),
                number: number.to_string(),
            },
        }
    }

    fn direct_chat_id(&self) -> String {
        format!("{}{DIRECT_SUFFIX}", self.contact.number)
    }
}

/// Forward console lines from `reader` as client events until `/quit` or EOF.
pub(crate) async fn forward_lines<R>(
    reader: R,
    tx: mpsc::Sender<ClientEvent>,
    direct_chat_id: String,
    sender_id: String,
) where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let event = match parse_line(&line) {
            None => continue,
            Some(ConsoleInput::Quit) => break,
            Some(ConsoleInput::State(state)) => ClientEvent::StateChanged(state),
            Some(ConsoleInput::Message { group, body }) => {
                let chat_id = if group {
                    GROUP_CHAT_ID
                } else {
                    direct_chat_id.as_str()
                };
                ClientEvent::Message(IncomingMessage::new(
                    chat_id,
                    &sender_id,
                    &body,
                    chrono::Utc::now().timestamp(),
                ))
            }
        };

        if tx.send(event).await.is_err() {
            debug!("console event receiver dropped");
            return;
        }
    }

    let _ = tx
        .send(ClientEvent::Disconnected("console closed".to_string()))
        .await;
}

#[async_trait]
impl ChatClient for ConsoleClient {
    fn name(&self) -> &str {
        "console"
    }

    async fn initialize(
        &self,
        session: Option<serde_json::Value>,
    ) -> Result<mpsc::Receiver<ClientEvent>, BotError> {
        let (tx, rx) = mpsc::channel(64);

        // Pairing is instant on the console: the QR payload is never scanned.
        let session = match session {
            Some(session) => session,
            None => {
                let code = format!("console-pairing-{}", uuid::Uuid::new_v4());
                tx.send(ClientEvent::Qr(code))
                    .await
                    .map_err(|e| BotError::Client(format!("console event send failed: {e}")))?;
                serde_json::json!({
                    "client": "console",
                    "number": self.contact.number,
                    "paired_at": chrono::Utc::now().to_rfc3339(),
                })
            }
        };

        for event in [ClientEvent::Authenticated(session), ClientEvent::Ready] {
            tx.send(event)
                .await
                .map_err(|e| BotError::Client(format!("console event send failed: {e}")))?;
        }

        let reader = BufReader::new(tokio::io::stdin());
        tokio::spawn(forward_lines(
            reader,
            tx,
            self.direct_chat_id(),
            self.contact.number.clone(),
        ));

        info!("console client started; type messages, /quit to exit");
        Ok(rx)
    }

    async fn chat(&self, message: &IncomingMessage) -> Result<Chat, BotError> {
        Ok(Chat {
            id: message.chat_id.clone(),
            is_group: message.chat_id.ends_with(GROUP_SUFFIX),
        })
    }

    async fn contact(&self, message: &IncomingMessage) -> Result<Contact, BotError> {
        if message.sender_id != self.contact.number {
            return Err(BotError::Client(format!(
                "unknown console sender '{}'",
                message.sender_id
            )));
        }
        Ok(self.contact.clone())
    }

    async fn send_seen(&self, chat: &Chat) -> Result<(), BotError> {
        debug!("console: marked {} as seen", chat.id);
        Ok(())
    }

    async fn send_message(&self, chat: &Chat, text: &str) -> Result<(), BotError> {
        println!("[{}] {text}", chat.id);
        Ok(())
    }

    async fn send_presence_available(&self) -> Result<(), BotError> {
        debug!("console: presence set to available");
        Ok(())
    }
}
