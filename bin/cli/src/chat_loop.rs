//! The read-infer-dispatch loop.
//!
//! Each turn reads one line, sends the transcript to the model and, when
//! the reply requests tools, runs them in order and asks the model once more
//! for the final answer. Tool calls in that second reply are answered with
//! [`FOLLOW_UP_TOOL_CALL`] instead of being run, so every request in the
//! transcript has a result before the next question.

use crate::error::ChatError;
use rootcause::prelude::ResultExt;
use std::collections::HashSet;
use std::io::{BufRead, Write};
use toolchat_ai::ModelGateway;
use toolchat_conversation::{Message, ToolRegistry, Transcript};
use toolchat_core::Result;
use tracing::{debug, info, instrument, warn};

/// Printed once before the first prompt.
pub const BANNER: &str = "Start chatting (type 'exit' to quit):";
/// Printed before reading each line.
pub const PROMPT: &str = "You: ";
/// Prefix of every printed model reply.
pub const REPLY_PREFIX: &str = "Bot: ";
/// Printed when the session ends.
pub const FAREWELL: &str = "👋 Exiting. Bye!";
/// Tool result for a tool call in the follow-up reply.
pub const FOLLOW_UP_TOOL_CALL: &str = "Tool calls are not supported in a follow-up response.";

/// Returns true if `line` asks to end the session.
#[must_use]
pub fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

/// Keeps only the first request for each tool-call id.
///
/// A repeated id could not be answered twice, so the transcript would
/// refuse the reply.
fn drop_repeated_calls(mut reply: Message) -> Message {
    let mut issued = HashSet::new();
    reply.tool_calls.retain(|call| {
        let first = issued.insert(call.id.clone());
        if !first {
            warn!(tool = %call.name, id = %call.id, "repeated tool call id dropped");
        }
        first
    });
    reply
}

/// A chat session: the transcript plus everything needed to extend it.
pub struct ChatLoop<G> {
    gateway: G,
    registry: ToolRegistry,
    transcript: Transcript,
}

impl<G: ModelGateway> ChatLoop<G> {
    /// Starts a session, advertising the registry's tools to the gateway.
    pub fn new(mut gateway: G, registry: ToolRegistry, system_prompt: impl Into<String>) -> Self {
        gateway.advertise(registry.descriptors());
        let transcript = Transcript::new(system_prompt);
        info!(
            transcript = %transcript.id(),
            model = gateway.model(),
            tools = registry.len(),
            "chat session started"
        );
        Self {
            gateway,
            registry,
            transcript,
        }
    }

    /// Returns the conversation so far.
    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the model gateway.
    #[must_use]
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Runs turns until `exit`, `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the model service fails or the terminal cannot
    /// be read or written. The session cannot continue after either.
    pub async fn run<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        mut output: W,
    ) -> Result<(), ChatError> {
        writeln!(output, "{BANNER}").map_err(ChatError::from)?;

        loop {
            write!(output, "{PROMPT}").map_err(ChatError::from)?;
            output.flush().map_err(ChatError::from)?;

            let mut line = String::new();
            if input.read_line(&mut line).map_err(ChatError::from)? == 0 {
                // End of input leaves the cursor after the prompt.
                writeln!(output).map_err(ChatError::from)?;
                break;
            }

            let line = line.trim();
            if is_exit_command(line) {
                break;
            }
            self.turn(line, &mut output).await?;
        }

        writeln!(output, "{FAREWELL}").map_err(ChatError::from)?;
        Ok(())
    }

    #[instrument(skip_all, fields(transcript = %self.transcript.id(), messages = self.transcript.len()))]
    async fn turn<W: Write>(&mut self, line: &str, output: &mut W) -> Result<(), ChatError> {
        self.append(Message::user(line))?;

        let reply = self
            .gateway
            .infer(&self.transcript)
            .await
            .context(ChatError::Inference {
                stage: "first reply",
            })
            .map(drop_repeated_calls)?;
        let calls = reply.tool_calls.clone();
        if calls.is_empty() {
            return self.answer(reply, output);
        }
        self.append(reply)?;

        for call in &calls {
            writeln!(output, "Tool called: {} with args: {}", call.name, call.arguments)
                .map_err(ChatError::from)?;
            let result = self.registry.dispatch(call).await;
            self.append(Message::tool_result(call.id.clone(), result))?;
        }
        debug!(tool_calls = calls.len(), "tool results appended");

        let follow_up = self
            .gateway
            .infer(&self.transcript)
            .await
            .context(ChatError::Inference {
                stage: "follow-up reply",
            })
            .map(drop_repeated_calls)?;
        self.answer(follow_up, output)
    }

    /// Appends the final reply of a turn and prints it.
    fn answer<W: Write>(&mut self, reply: Message, output: &mut W) -> Result<(), ChatError> {
        let content = reply.content.clone();
        let ignored = reply.tool_calls.clone();
        self.append(reply)?;

        for call in ignored {
            warn!(tool = %call.name, id = %call.id, "tool call in follow-up reply not dispatched");
            self.append(Message::tool_result(call.id, FOLLOW_UP_TOOL_CALL))?;
        }

        writeln!(output, "{REPLY_PREFIX}{content}").map_err(ChatError::from)?;
        Ok(())
    }

    fn append(&mut self, message: Message) -> Result<(), ChatError> {
        self.transcript
            .append(message)
            .context(ChatError::Transcript)
    }
}
