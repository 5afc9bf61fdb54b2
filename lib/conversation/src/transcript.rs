//! The conversation transcript.
//!
//! A transcript is the ordered, append-only history sent to the model on every
//! request. It starts with exactly one system message and rejects any append
//! that would leave a tool result without a matching request, or that would
//! move the conversation on while requests are still unanswered.

use crate::error::TranscriptError;
use crate::message::{Message, MessageRole, ToolCallId};
use rootcause::prelude::Report;
use toolchat_core::TranscriptId;

/// An append-only conversation history.
#[derive(Debug, Clone)]
pub struct Transcript {
    id: TranscriptId,
    messages: Vec<Message>,
    /// Requests from the latest assistant message not yet answered, in issue order.
    pending: Vec<ToolCallId>,
}

impl Transcript {
    /// Starts a transcript with its system message.
    #[must_use]
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            id: TranscriptId::new(),
            messages: vec![Message::system(system_prompt)],
            pending: Vec::new(),
        }
    }

    /// Returns the transcript id.
    #[must_use]
    pub fn id(&self) -> TranscriptId {
        self.id
    }

    /// Appends a message.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the transcript unchanged, if the message
    /// would break referential integrity between tool calls and results.
    pub fn append(&mut self, message: Message) -> Result<(), Report<TranscriptError>> {
        match message.role {
            MessageRole::System => return Err(TranscriptError::UnexpectedSystemMessage.into()),
            MessageRole::User => self.require_settled()?,
            MessageRole::Assistant => {
                self.require_settled()?;
                let mut issued: Vec<ToolCallId> = Vec::with_capacity(message.tool_calls.len());
                for call in &message.tool_calls {
                    if issued.contains(&call.id) {
                        return Err(TranscriptError::DuplicateToolCall {
                            id: call.id.to_string(),
                        }
                        .into());
                    }
                    issued.push(call.id.clone());
                }
                self.pending = issued;
            }
            MessageRole::ToolResult => {
                let id = message
                    .tool_call_id
                    .as_ref()
                    .ok_or(TranscriptError::MissingToolCallId)?;
                let position = self
                    .pending
                    .iter()
                    .position(|pending| pending == id)
                    .ok_or_else(|| TranscriptError::UnknownToolCall { id: id.to_string() })?;
                self.pending.remove(position);
            }
        }

        self.messages.push(message);
        Ok(())
    }

    fn require_settled(&self) -> Result<(), Report<TranscriptError>> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(TranscriptError::UnansweredToolCalls {
                ids: self.pending.iter().map(ToString::to_string).collect(),
            }
            .into())
        }
    }

    /// Returns true when every tool call has been answered.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns all messages in order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages, including the system message.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false: a transcript holds at least its system message.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
