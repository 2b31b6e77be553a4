//! Per-message dispatch: filter, log, mark seen, resolve, reply.

use chrono::{Local, NaiveDateTime, TimeZone};
use thunderbot_core::{
    error::BotError,
    message::{Contact, IncomingMessage},
    resolver,
    settings::Settings,
    traits::ChatClient,
};
use thunderbot_log::MessageLog;
use tracing::{debug, info, warn};

/// What happened to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Dispatch {
    /// Chat or contact could not be fetched; nothing was done.
    Dropped,
    /// Group message while group answers are disabled.
    FilteredGroup,
    /// Seen, but no rule or default answer applied.
    NoAnswer,
    /// A reply was sent (or attempted).
    Replied(String),
}

/// `<dd/MM/yy HH:mm:ss> - <name>@<number>: <body>`
pub(crate) fn format_log_line(when: NaiveDateTime, contact: &Contact, body: &str) -> String {
    format!(
        "{} - {}@{}: {body}",
        when.format("%d/%m/%y %H:%M:%S"),
        contact.push_name,
        contact.number
    )
}

/// Local wall-clock time of a platform timestamp.
///
/// An ambiguous local time resolves to the earlier reading; only an
/// out-of-range timestamp falls back to now.
pub(crate) fn local_time(timestamp: i64) -> NaiveDateTime {
    Local
        .timestamp_opt(timestamp, 0)
        .earliest()
        .unwrap_or_else(Local::now)
        .naive_local()
}

/// Handle one incoming message against a settings snapshot.
///
/// Only a message log that was never started is returned as an error; every
/// other failure is logged and the bot moves on.
pub(crate) async fn handle_message(
    client: &dyn ChatClient,
    settings: &Settings,
    message_log: &mut MessageLog,
    message: &IncomingMessage,
    now: NaiveDateTime,
) -> Result<Dispatch, BotError> {
    let chat = match client.chat(message).await {
        Ok(chat) => chat,
        Err(e) => {
            warn!("dropping message {}: failed to fetch chat: {e}", message.id);
            return Ok(Dispatch::Dropped);
        }
    };
    let contact = match client.contact(message).await {
        Ok(contact) => contact,
        Err(e) => {
            warn!("dropping message {}: failed to fetch contact: {e}", message.id);
            return Ok(Dispatch::Dropped);
        }
    };

    if chat.is_group && !settings.answer_groups {
        debug!("ignoring group message in {}", chat.id);
        return Ok(Dispatch::FilteredGroup);
    }

    if settings.logging.enabled {
        let line = format_log_line(local_time(message.timestamp), &contact, &message.body);
        match message_log.append(&line) {
            Ok(()) => {}
            Err(BotError::LogNotInitialized) => return Err(BotError::LogNotInitialized),
            Err(e) => warn!("failed to log message {}: {e}", message.id),
        }
    }

    if let Err(e) = client.send_seen(&chat).await {
        debug!("send_seen failed for {}: {e}", chat.id);
    }

    let body = message.body.to_lowercase();
    let Some(response) = resolver::resolve(
        &body,
        settings.rules(),
        &settings.default_answer,
        now,
    ) else {
        info!("ignoring message from {}", message.sender_id);
        return Ok(Dispatch::NoAnswer);
    };

    if let Err(e) = client.send_message(&chat, &response).await {
        warn!("failed to reply in {}: {e}", chat.id);
    }
    Ok(Dispatch::Replied(response))
}
