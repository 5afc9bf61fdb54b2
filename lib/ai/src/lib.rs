//! Language-model access for toolchat.
//!
//! [`ModelGateway`] is the seam the chat loop talks through.
//! [`OpenAiGateway`] implements it for OpenAI-compatible chat-completions
//! services such as Groq.

pub mod backend;
pub mod error;
pub mod openai;

pub use backend::{ModelConfig, ModelGateway};
pub use error::LlmError;
pub use openai::OpenAiGateway;
