//! Core types shared by every toolchat crate.
//!
//! Holds the strongly-typed identifiers, the redacting [`ApiKey`] and the
//! `Result` alias that the conversation, AI and integration crates build on.

pub mod error;
pub mod id;
pub mod secret;

pub use error::Result;
pub use id::{InvocationId, MessageId, TranscriptId};
pub use secret::ApiKey;
