//! Rotating message log: one line per received message, rolled by size.
//!
//! Writes are synchronous so lines land in arrival order and a rotation can
//! never interleave with a write. The size cap is checked before each append,
//! so a file may overshoot the cap by at most one line.


use chrono::{Local, NaiveDateTime};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thunderbot_core::error::BotError;
use tracing::{debug, info};

/// File name for a log opened at `now`: `Messages_<ddMMyy>_<HHmmss><mmm>.log`.
pub fn log_filename(now: NaiveDateTime) -> String {
    format!("Messages_{}.log", now.format("%d%m%y_%H%M%S%3f"))
}

/// A fresh path in `directory` for a log opened at `now`.
///
/// Two rotations within the same millisecond would produce the same name,
/// so a `_<n>` counter is added until the name is unused.
fn next_log_path(directory: &Path, now: NaiveDateTime) -> PathBuf {
    let name = log_filename(now);
    let candidate = directory.join(&name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = name.trim_end_matches(".log");
    (1u32..)
        .map(|n| directory.join(format!("{stem}_{n}.log")))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

fn open_append(path: &Path) -> Result<File, BotError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| BotError::Log(format!("failed to open {}: {e}", path.display())))
}

struct OpenLog {
    path: PathBuf,
    file: File,
}

/// Size-capped message log.
pub struct MessageLog {
    directory: PathBuf,
    max_size_bytes: u64,
    current: Option<OpenLog>,
}

impl MessageLog {
    /// Create a log writing into `directory`. Nothing is opened until [`start`](Self::start).
    pub fn new(directory: impl Into<PathBuf>, max_size_bytes: u64) -> Self {
        Self {
            directory: directory.into(),
            max_size_bytes,
            current: None,
        }
    }

    pub fn is_started(&self) -> bool {
        self.current.is_some()
    }

    /// Path of the file currently written to.
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|open| open.path.as_path())
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Change the cap. Takes effect on the next append.
    pub fn set_max_size_bytes(&mut self, max_size_bytes: u64) {
        self.max_size_bytes = max_size_bytes;
    }

    /// Open a new log file named after the current local time.
    pub fn start(&mut self) -> Result<(), BotError> {
        std::fs::create_dir_all(&self.directory).map_err(|e| {
            BotError::Log(format!(
                "failed to create log directory {}: {e}",
                self.directory.display()
            ))
        })?;

        let open = self.open_next()?;
        info!("message log started at {}", open.path.display());
        self.current = Some(open);
        Ok(())
    }

    /// Append one line, rolling to a new file first if the current one is over the cap.
    pub fn append(&mut self, line: &str) -> Result<(), BotError> {
        let size = {
            let open = self.current.as_ref().ok_or(BotError::LogNotInitialized)?;
            open.file.metadata()?.len()
        };

        if size > self.max_size_bytes {
            self.rotate(size)?;
        }

        let open = self.current.as_mut().ok_or(BotError::LogNotInitialized)?;
        writeln!(open.file, "{line}")?;
        Ok(())
    }

    fn rotate(&mut self, size: u64) -> Result<(), BotError> {
        let next = self.open_next()?;
        info!(
            "message log reached {size} bytes (cap {}), rotating to {}",
            self.max_size_bytes,
            next.path.display()
        );
        // Replacing the handle closes the previous file.
        if let Some(previous) = self.current.replace(next) {
            debug!("closed {}", previous.path.display());
        }
        Ok(())
    }

    fn open_next(&self) -> Result<OpenLog, BotError> {
        let path = next_log_path(&self.directory, Local::now().naive_local());
        let file = open_append(&path)?;
        Ok(OpenLog { path, file })
    }
}
