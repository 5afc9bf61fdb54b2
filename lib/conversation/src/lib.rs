//! Conversation state and tool dispatch for toolchat.
//!
//! This crate provides:
//!
//! - **Messages**: system, user, assistant and tool-result messages
//! - **Transcript**: the append-only history sent to the model
//! - **Tool Registry**: tool descriptors, argument validation and dispatch

pub mod error;
pub mod message;
pub mod tool;
pub mod transcript;

pub use error::{TOOL_NOT_RECOGNIZED, ToolError, TranscriptError};
pub use message::{Message, MessageRole, ToolCallId, ToolCallRequest};
pub use tool::{ParamType, ToolArguments, ToolDescriptor, ToolExecutor, ToolParameter, ToolRegistry};
pub use transcript::Transcript;
