//! Core functionality for exporting deduplicated channel images.
//!
//! This library provides the components of a Forwarder channel import:
//! - Content fingerprinting (perceptual hash and content digest)
//! - Bot resolution from a Forwarder config
//! - The oldest-first streaming dedup pipeline
//! - Atomic manifest output

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use config::{BotMapping, BotRecord, Config, LogLevel};
pub use error::{Error, Result};
pub use manifest::{ImportEntry, Manifest};
pub use pipeline::{find_channel, ImportStats, ImportSummary, Importer};
pub use platform::{BotLogin, Channel, Dialog, Message, Session};
pub use processing::{fingerprint, Fingerprint, PHash};
pub use progress::ImportProgress;
pub use resolver::resolve_bot;

// -- Public Modules --
pub mod config;
pub mod logging;
pub mod manifest;
pub mod pipeline;
pub mod platform;
pub mod processing;
pub mod progress;
pub mod resolver;

// -- Test Modules --
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
