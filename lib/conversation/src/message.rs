//! Message types for conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use toolchat_core::MessageId;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Instructions for the model, always first in a transcript.
    System,
    /// User/human message.
    User,
    /// Model reply, possibly carrying tool-call requests.
    Assistant,
    /// Output of one executed tool-call request.
    ToolResult,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::ToolResult => "tool_result",
        };
        f.write_str(s)
    }
}

/// Identifier the model assigns to a tool-call request.
///
/// The value is opaque and provider-chosen (`call_abc123`), so unlike the
/// ULID ids in `toolchat-core` it is kept as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolCallId(String);

impl ToolCallId {
    /// Wraps a provider-assigned identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolCallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ToolCallId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ToolCallId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A tool invocation requested by the model.
///
/// `arguments` holds the JSON text exactly as the model produced it. It is
/// decoded and checked against the tool's parameters only at dispatch time,
/// see [`ToolDescriptor::validate`](crate::tool::ToolDescriptor::validate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Identifier, unique among the requests of one assistant message.
    pub id: ToolCallId,
    /// The tool name.
    pub name: String,
    /// JSON-encoded argument object.
    pub arguments: String,
}

impl ToolCallRequest {
    /// Creates a new tool-call request.
    #[must_use]
    pub fn new(
        id: impl Into<ToolCallId>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// A message in a conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// Message role.
    pub role: MessageRole,
    /// Message content. May be empty for assistant messages that only request tools.
    pub content: String,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
    /// Tool-call requests, in the order the model issued them (assistant only).
    pub tool_calls: Vec<ToolCallRequest>,
    /// The request this message answers (tool results only).
    pub tool_call_id: Option<ToolCallId>,
}

impl Message {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Creates a tool result answering `tool_call_id`.
    #[must_use]
    pub fn tool_result(tool_call_id: ToolCallId, content: impl Into<String>) -> Self {
        let mut msg = Self::new(MessageRole::ToolResult, content);
        msg.tool_call_id = Some(tool_call_id);
        msg
    }

    /// Adds a tool-call request.
    #[must_use]
    pub fn with_tool_call(mut self, tool_call: ToolCallRequest) -> Self {
        self.tool_calls.push(tool_call);
        self
    }

    /// Returns true if this message has tool calls.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
