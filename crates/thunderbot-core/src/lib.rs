//! # thunderbot-core
//!
//! Core types, traits, settings, and response resolution for Thunderbot.

pub mod error;
pub mod message;
pub mod resolver;
pub mod settings;
pub mod traits;
