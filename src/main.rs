mod gateway;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thunderbot_channels::{console::ConsoleClient, session::SessionStore};
use thunderbot_core::{
    settings::{self, SettingsStore, RELOAD_DEBOUNCE},
    traits::ChatClient,
};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "thunderbot",
    version,
    about = "Thunderbot: rule-based WhatsApp auto-responder"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the settings file.
    #[arg(short, long, default_value = "settings/settings.json")]
    settings: PathBuf,

    /// Path to the persisted client session.
    #[arg(long, default_value = "sessions/thunderbot.json")]
    session: PathBuf,

    /// Also write diagnostics to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot on the console client.
    Start {
        /// Display name of the console contact.
        #[arg(long, default_value = "Console")]
        name: String,
        /// Phone number of the console contact.
        #[arg(long, default_value = "5500000000000")]
        number: String,
    },
    /// Validate the settings file and print a summary.
    Check,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = init_tracing(cli.log_file.as_deref())?;

    match &cli.command {
        Commands::Start { name, number } => {
            let store = SettingsStore::open(&cli.settings)
                .context("the settings file couldn't be loaded")?;

            // Keep the watcher alive for the whole run.
            let (_watcher, settings_rx) = settings::watch(store.path(), RELOAD_DEBOUNCE)?;

            let client: Arc<dyn ChatClient> = Arc::new(ConsoleClient::new(name, number));
            let session = SessionStore::new(&cli.session);

            let gw = gateway::Gateway::new(client, store, session);
            gw.run(settings_rx).await?;
            info!("bot finished");
        }
        Commands::Check => check(&cli.settings)?,
    }

    Ok(())
}

/// Install the tracing subscriber: stderr always, plus a file when requested.
///
/// Stdout is left to the console client for replies.
fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .with_context(|| format!("--log-file {} does not name a file", path.display()))?;
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Load the settings file and print what it configures.
fn check(path: &Path) -> anyhow::Result<()> {
    let cfg = settings::load(path)?;

    println!("Thunderbot Settings Check\n");
    println!("Settings: {}", path.display());
    println!("  rules: {}", cfg.rules().len());
    println!(
        "  answer groups: {}",
        if cfg.answer_groups { "yes" } else { "no" }
    );
    println!(
        "  online status: {}",
        if cfg.show_online_status { "shown" } else { "hidden" }
    );
    if cfg.logging.enabled {
        println!(
            "  message log: {} (rotate above {} bytes)",
            cfg.logging.directory, cfg.logging.max_size_bytes
        );
    } else {
        println!("  message log: disabled");
    }
    if cfg.logging.rotates_every_message() {
        println!("  warning: no maximum_logsize_bytes set, every message starts a new log file");
    }

    let default_answer = &cfg.default_answer;
    let mode = match default_answer.text.as_deref() {
        None | Some("") => "ignore unmatched messages".to_string(),
        Some(_) if default_answer.by_time_of_day => "time-of-day greeting".to_string(),
        Some(text) if Path::new(text).is_file() => format!("contents of {text}"),
        Some(text) => format!("\"{text}\""),
    };
    println!("  default answer: {mode}");

    let empty = cfg
        .rules()
        .iter()
        .filter(|rule| rule.answer_to_exact.is_empty() && rule.answer_to_contains.is_empty())
        .count();
    if empty > 0 {
        println!("\n  warning: {empty} rule(s) have no answer and will never match");
    }

    Ok(())
}
