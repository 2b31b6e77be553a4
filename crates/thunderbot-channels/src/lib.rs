//! # thunderbot-channels
//!
//! Chat client implementations and session persistence for Thunderbot.

pub mod console;
pub mod session;
