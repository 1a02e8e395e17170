//! # Hermes Protocol
//!
//! Message schemas and MQTT topic templates for the Hermes voice-assistant
//! protocol (Snips-compatible, with the Rhasspy extensions).
//!
//! ## Layout
//!
//! - [`MessageKind`] / [`Message`]: the closed registry of schemas, one per
//!   MQTT topic, with JSON or raw-WAV payloads
//! - [`topic`]: topic templates with `{placeholder}` substitution,
//!   wildcard subscription patterns, and value extraction
//! - One module per protocol component: [`asr`], [`audioserver`],
//!   [`dialogue`], [`g2p`], [`handle`], [`nlu`], [`tts`], [`train`],
//!   [`wake`]
//!
//! Wire payloads use lower-camel-case JSON keys (`siteId`, `sessionId`);
//! the Rust structs map them to snake case in both directions.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod asr;
pub mod audioserver;
pub mod dialogue;
pub mod g2p;
pub mod handle;
pub mod intent;
pub mod message;
pub mod nlu;
pub mod topic;
pub mod train;
pub mod tts;
pub mod wake;

pub use message::{BinaryBody, DecodeError, EncodeError, Message, MessageKind};
pub use topic::{TopicArgs, TopicError, TopicTemplate};

/// Site id used when a message names no site of its own.
pub const DEFAULT_SITE_ID: &str = "default";

pub(crate) fn default_site_id() -> String {
    DEFAULT_SITE_ID.to_string()
}

pub(crate) fn default_true() -> bool {
    true
}
