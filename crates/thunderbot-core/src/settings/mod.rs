mod defaults;
mod watcher;

#[cfg(test)]
mod tests;

pub use watcher::{watch, SettingsSignal, SettingsWatcher, RELOAD_DEBOUNCE};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::BotError;
use defaults::*;

/// On-disk layout: every setting lives under a top-level `bot` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SettingsFile {
    bot: Settings,
}

/// Bot settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Whether messages posted in group chats get replies.
    #[serde(default)]
    pub answer_groups: bool,
    /// Whether the account advertises itself as online.
    #[serde(default)]
    pub show_online_status: bool,
    #[serde(default, rename = "log_messages")]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub default_answer: DefaultAnswer,
}

impl Settings {
    /// Response rules in priority order.
    pub fn rules(&self) -> &[Rule] {
        &self.events.on_message_received
    }
}

/// Message log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default, rename = "activated")]
    pub enabled: bool,
    /// Size after which the log rolls over to a new file.
    #[serde(
        default,
        rename = "maximum_logsize_bytes",
        deserialize_with = "u64_or_numeric_string"
    )]
    pub max_size_bytes: u64,
    /// Directory log files are created in.
    #[serde(default = "default_log_directory")]
    pub directory: String,
}

impl LoggingConfig {
    /// Logging is on but no size cap is set, so every message opens a new file.
    pub fn rotates_every_message(&self) -> bool {
        self.enabled && self.max_size_bytes == 0
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_size_bytes: 0,
            directory: default_log_directory(),
        }
    }
}

/// Event-bound rule lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default)]
    pub on_message_received: Vec<Rule>,
}

/// One configured mapping from candidate message texts to a response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default, rename = "case_sensitivity")]
    pub case_sensitive: bool,
    /// Candidates compared against the whole message body.
    #[serde(default, rename = "message_exact_text")]
    pub exact_texts: Vec<String>,
    /// Candidates searched for inside the message body.
    #[serde(default, rename = "message_contains_text")]
    pub contains_texts: Vec<String>,
    #[serde(default, rename = "answer_to_exact_text")]
    pub answer_to_exact: String,
    #[serde(default, rename = "answer_to_contains_text")]
    pub answer_to_contains: String,
}

/// Fallback answer used when no rule matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultAnswer {
    /// Literal answer or path to a file holding it. `None` (or empty) = ignore the message.
    #[serde(default, rename = "answer", deserialize_with = "string_or_none")]
    pub text: Option<String>,
    #[serde(default, rename = "answer_by_timeofday_enabled")]
    pub by_time_of_day: bool,
    #[serde(default, rename = "answers")]
    pub time_of_day: TimeOfDayAnswers,
}

/// Canned answers per period of the day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOfDayAnswers {
    /// 06:00–11:59.
    #[serde(default)]
    pub morning: String,
    /// 12:00–17:59.
    #[serde(default)]
    pub afternoon: String,
    /// 18:00–23:59.
    #[serde(default)]
    pub night: String,
    /// 00:00–05:59.
    #[serde(default)]
    pub dawn: String,
}

/// Parse settings from a JSON document.
pub fn parse(content: &str) -> Result<Settings, BotError> {
    let file: SettingsFile = serde_json::from_str(content)
        .map_err(|e| BotError::Settings(format!("failed to parse settings: {e}")))?;
    Ok(file.bot)
}

/// Load settings from a JSON file.
///
/// Unlike most config loaders there is no fallback: a missing file is an error.
pub fn load(path: &Path) -> Result<Settings, BotError> {
    if !path.exists() {
        return Err(BotError::Settings(format!(
            "settings file not found at {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| BotError::Settings(format!("failed to read {}: {e}", path.display())))?;

    let settings = parse(&content)?;
    if settings.logging.rotates_every_message() {
        warn!(
            "{}: message logging is activated without maximum_logsize_bytes; \
             every message will start a new log file",
            path.display()
        );
    }
    Ok(settings)
}

/// Owner of the current settings snapshot.
///
/// Consumers take an [`Arc`] snapshot per message; a reload swaps the
/// snapshot without touching the ones already handed out.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    current: Arc<Settings>,
}

impl SettingsStore {
    /// Load the settings file. Fails if it is missing or malformed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, BotError> {
        let path = path.into();
        let settings = load(&path)?;
        info!(
            "settings loaded from {} ({} rules)",
            path.display(),
            settings.rules().len()
        );
        Ok(Self {
            path,
            current: Arc::new(settings),
        })
    }

    /// Build a store around already-parsed settings.
    pub fn from_settings(path: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            path: path.into(),
            current: Arc::new(settings),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current settings snapshot.
    pub fn snapshot(&self) -> Arc<Settings> {
        Arc::clone(&self.current)
    }

    /// Re-read the settings file.
    ///
    /// On failure the previous snapshot stays in place and the error is returned.
    pub fn reload(&mut self) -> Result<Arc<Settings>, BotError> {
        match load(&self.path) {
            Ok(settings) => {
                info!(
                    "settings reloaded from {} ({} rules)",
                    self.path.display(),
                    settings.rules().len()
                );
                self.current = Arc::new(settings);
                Ok(self.snapshot())
            }
            Err(e) => {
                warn!("settings reload failed, keeping previous settings: {e}");
                Err(e)
            }
        }
    }
}
