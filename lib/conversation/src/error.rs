//! Error types for the conversation crate.
//!
//! - `TranscriptError`: an append would break the transcript's invariants
//! - `ToolError`: a tool call could not be executed as requested

use std::fmt;

/// Literal tool result for a request naming a tool that is not registered.
pub const TOOL_NOT_RECOGNIZED: &str = "Tool not recognized.";

/// Errors from transcript operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptError {
    /// A system message was appended after the transcript was started.
    UnexpectedSystemMessage,
    /// A user or assistant message was appended while tool calls were unanswered.
    UnansweredToolCalls { ids: Vec<String> },
    /// A tool result did not say which request it answers.
    MissingToolCallId,
    /// A tool result referenced no outstanding request.
    UnknownToolCall { id: String },
    /// An assistant message reused a request id that is still outstanding.
    DuplicateToolCall { id: String },
}

impl fmt::Display for TranscriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedSystemMessage => {
                write!(f, "system message must be the first message of a transcript")
            }
            Self::UnansweredToolCalls { ids } => {
                write!(f, "tool calls still unanswered: {}", ids.join(", "))
            }
            Self::MissingToolCallId => write!(f, "tool result has no tool call id"),
            Self::UnknownToolCall { id } => {
                write!(f, "tool result references unknown tool call: {id}")
            }
            Self::DuplicateToolCall { id } => write!(f, "duplicate tool call id: {id}"),
        }
    }
}

impl std::error::Error for TranscriptError {}

/// Errors from tool dispatch.
///
/// These never escape a turn. [`ToolError::tool_result`] turns each one into
/// the text the model receives in place of a real result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// No tool is registered under this name.
    NotRecognized { name: String },
    /// The arguments were not a JSON object or did not match the parameters.
    InvalidArguments { name: String, reason: String },
}

impl ToolError {
    /// Returns the tool-result text reported back to the model.
    #[must_use]
    pub fn tool_result(&self) -> String {
        match self {
            Self::NotRecognized { .. } => TOOL_NOT_RECOGNIZED.to_string(),
            Self::InvalidArguments { name, reason } => {
                format!("Invalid arguments for tool '{name}': {reason}")
            }
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRecognized { name } => write!(f, "tool not recognized: {name}"),
            Self::InvalidArguments { name, reason } => {
                write!(f, "invalid arguments for tool '{name}': {reason}")
            }
        }
    }
}

impl std::error::Error for ToolError {}
