//! # thunderbot-log
//!
//! Size-capped, append-only message log for Thunderbot.

pub mod rotating;

pub use rotating::{log_filename, MessageLog};
