//! Errors that end the chat session.
//!
//! Tool failures never show up here; they are reported to the model as
//! tool results. What remains is startup, the model service and the
//! terminal.

use std::fmt;

/// Errors that terminate the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Settings could not be loaded.
    Configuration { reason: String },
    /// A client could not be constructed.
    Startup { component: &'static str },
    /// The model service failed to reply.
    Inference { stage: &'static str },
    /// The transcript refused a message.
    Transcript,
    /// Reading input or writing output failed.
    Terminal { reason: String },
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { reason } => {
                write!(f, "failed to load configuration: {reason}")
            }
            Self::Startup { component } => write!(f, "failed to set up {component}"),
            Self::Inference { stage } => {
                write!(f, "model inference failed for the {stage}")
            }
            Self::Transcript => write!(f, "transcript rejected a message"),
            Self::Terminal { reason } => write!(f, "terminal I/O failed: {reason}"),
        }
    }
}

impl std::error::Error for ChatError {}

impl From<std::io::Error> for ChatError {
    fn from(e: std::io::Error) -> Self {
        Self::Terminal {
            reason: e.to_string(),
        }
    }
}
