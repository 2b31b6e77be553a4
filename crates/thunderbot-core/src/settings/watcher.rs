//! Settings file watcher: turns filesystem notifications into debounced reload signals.

use crate::error::BotError;
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Quiet period between the first change notification and the reload.
pub const RELOAD_DEBOUNCE: Duration = Duration::from_secs(5);

/// What the gateway should do about the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSignal {
    /// Contents changed; reload.
    Changed,
    /// The file was renamed or removed; the watch target is gone.
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileChange {
    Modified,
    Renamed,
}

/// Keeps the OS watcher and the debounce task alive.
pub struct SettingsWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl Drop for SettingsWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Map a raw notification onto the two changes we act on.
pub(crate) fn classify(kind: &EventKind) -> Option<FileChange> {
    match kind {
        EventKind::Modify(ModifyKind::Name(_)) | EventKind::Remove(_) => Some(FileChange::Renamed),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) | EventKind::Create(_) => Some(FileChange::Modified),
        _ => None,
    }
}

/// Watch `path` and emit a [`SettingsSignal`] for every burst of changes.
///
/// A burst of modifications produces a single `Changed` once `debounce` has
/// elapsed since the first event. A rename or removal produces `Lost` and
/// ends the stream.
pub fn watch(
    path: &Path,
    debounce: Duration,
) -> Result<(SettingsWatcher, mpsc::Receiver<SettingsSignal>), BotError> {
    let (raw_tx, raw_rx) = mpsc::unbounded_channel::<FileChange>();

    let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
        match result {
            Ok(event) => {
                if let Some(change) = classify(&event.kind) {
                    let _ = raw_tx.send(change);
                }
            }
            Err(e) => warn!("settings watcher error: {e}"),
        }
    })
    .map_err(|e| BotError::Settings(format!("failed to create settings watcher: {e}")))?;

    watcher
        .watch(path, RecursiveMode::NonRecursive)
        .map_err(|e| {
            BotError::Settings(format!("failed to watch {}: {e}", path.display()))
        })?;

    let (tx, rx) = mpsc::channel(8);
    let task = tokio::spawn(debounce_changes(raw_rx, tx, debounce));

    info!("watching {} for changes", path.display());
    Ok((
        SettingsWatcher {
            _watcher: watcher,
            task,
        },
        rx,
    ))
}

/// Collapse raw file changes into debounced signals.
pub(crate) async fn debounce_changes(
    mut raw: mpsc::UnboundedReceiver<FileChange>,
    tx: mpsc::Sender<SettingsSignal>,
    debounce: Duration,
) {
    while let Some(change) = raw.recv().await {
        if change == FileChange::Renamed {
            let _ = tx.send(SettingsSignal::Lost).await;
            return;
        }

        let deadline = tokio::time::sleep(debounce);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                _ = &mut deadline => break,
                next = raw.recv() => match next {
                    Some(FileChange::Modified) => debug!("settings change folded into pending reload"),
                    Some(FileChange::Renamed) => {
                        let _ = tx.send(SettingsSignal::Lost).await;
                        return;
                    }
                    None => return,
                },
            }
        }

        if tx.send(SettingsSignal::Changed).await.is_err() {
            return;
        }
    }
}
