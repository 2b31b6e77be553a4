//! The gateway: one event loop connecting the chat client, settings, and message log.
//!
//! Client events and settings signals are handled one at a time, start to
//! finish, so a settings reload never lands in the middle of a message.

mod dispatch;


use anyhow::{anyhow, bail};
use chrono::Local;
use std::sync::Arc;
use thunderbot_channels::session::SessionStore;
use thunderbot_core::{
    error::BotError,
    message::{ClientEvent, ClientState},
    settings::{SettingsSignal, SettingsStore},
    traits::ChatClient,
};
use thunderbot_log::MessageLog;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Whether the loop keeps going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Shutdown,
}

/// The central gateway that routes client events to their handlers.
pub struct Gateway {
    pub(super) client: Arc<dyn ChatClient>,
    pub(super) settings: SettingsStore,
    pub(super) session: SessionStore,
    pub(super) message_log: MessageLog,
    /// Set once the client reported `Ready`.
    pub(super) ready: bool,
}

impl Gateway {
    /// Create a new gateway. The message log is configured from the current settings
    /// but only opened once the client is ready.
    pub fn new(client: Arc<dyn ChatClient>, settings: SettingsStore, session: SessionStore) -> Self {
        let snapshot = settings.snapshot();
        let message_log = MessageLog::new(
            &snapshot.logging.directory,
            snapshot.logging.max_size_bytes,
        );
        Self {
            client,
            settings,
            session,
            message_log,
            ready: false,
        }
    }

    /// Run the main event loop until the client shuts down or a fatal error occurs.
    pub async fn run(
        mut self,
        mut settings_rx: mpsc::Receiver<SettingsSignal>,
    ) -> anyhow::Result<()> {
        let session = match self.session.load() {
            Ok(session) => session,
            Err(e) => {
                warn!("discarding unreadable session: {e}");
                if let Err(e) = self.session.delete() {
                    warn!("{e}");
                }
                None
            }
        };

        info!(
            "Thunderbot gateway running | client: {} | session: {}",
            self.client.name(),
            if session.is_some() { "restored" } else { "new" }
        );

        let mut events = self
            .client
            .initialize(session)
            .await
            .map_err(|e| anyhow!("failed to initialize {} client: {e}", self.client.name()))?;

        loop {
            tokio::select! {
                signal = settings_rx.recv() => match signal {
                    Some(signal) => self.handle_settings_signal(signal)?,
                    None => bail!("settings watcher stopped unexpectedly"),
                },
                event = events.recv() => match event {
                    Some(event) => {
                        if self.handle_event(event).await? == Flow::Shutdown {
                            break;
                        }
                    }
                    None => {
                        info!("{} client event stream closed", self.client.name());
                        break;
                    }
                },
            }
        }

        info!("Thunderbot gateway stopped");
        Ok(())
    }

    /// React to a settings file signal.
    pub(crate) fn handle_settings_signal(&mut self, signal: SettingsSignal) -> anyhow::Result<()> {
        match signal {
            SettingsSignal::Lost => bail!(
                "settings file {} was renamed or removed",
                self.settings.path().display()
            ),
            SettingsSignal::Changed => {
                // A failed reload keeps the previous snapshot; the store already logged it.
                let Ok(settings) = self.settings.reload() else {
                    return Ok(());
                };
                self.message_log
                    .set_max_size_bytes(settings.logging.max_size_bytes);
                if self.ready && settings.logging.enabled && !self.message_log.is_started() {
                    info!("message logging enabled by settings reload");
                    self.message_log.start()?;
                }
                Ok(())
            }
        }
    }

    /// Handle one client event.
    pub(crate) async fn handle_event(&mut self, event: ClientEvent) -> anyhow::Result<Flow> {
        match event {
            ClientEvent::Qr(code) => {
                info!("pairing required: scan the QR code with your phone");
                debug!("QR data: {code}");
            }
            ClientEvent::Authenticated(session) => {
                info!("authenticated");
                if let Err(e) = self.session.save(&session) {
                    error!("failed to save session: {e}");
                }
            }
            ClientEvent::AuthFailure(reason) => {
                warn!("authentication failed: {reason}; falling back to QR pairing");
                if let Err(e) = self.session.delete() {
                    error!("{e}");
                }
            }
            ClientEvent::Ready => self.on_ready().await?,
            ClientEvent::Message(message) => {
                let settings = self.settings.snapshot();
                if settings.show_online_status {
                    if let Err(e) = self.client.send_presence_available().await {
                        debug!("presence update failed: {e}");
                    }
                }

                let now = Local::now().naive_local();
                match dispatch::handle_message(
                    self.client.as_ref(),
                    &settings,
                    &mut self.message_log,
                    &message,
                    now,
                )
                .await
                {
                    Ok(outcome) => debug!("message {} handled: {outcome:?}", message.id),
                    Err(BotError::LogNotInitialized) => bail!(
                        "message logging is enabled but the message log was not started"
                    ),
                    Err(e) => return Err(e.into()),
                }
            }
            ClientEvent::StateChanged(ClientState::Timeout) => {
                info!("client timed out, shutting down");
                return Ok(Flow::Shutdown);
            }
            ClientEvent::StateChanged(state) => info!("client state changed: {state:?}"),
            ClientEvent::Disconnected(reason) => warn!("client disconnected: {reason}"),
        }
        Ok(Flow::Continue)
    }

    async fn on_ready(&mut self) -> anyhow::Result<()> {
        self.ready = true;
        let settings = self.settings.snapshot();

        if settings.show_online_status {
            if let Err(e) = self.client.send_presence_available().await {
                warn!("failed to set presence: {e}");
            }
        }

        if settings.logging.enabled && !self.message_log.is_started() {
            info!("message logging activated");
            self.message_log
                .start()
                .map_err(|e| anyhow!("failed to start message log: {e}"))?;
        }

        info!("loading completed, waiting for messages...");
        Ok(())
    }
}
