//! Terminal chat loop where the model may call local tools.
//!
//! [`ChatLoop`] owns the transcript and drives each turn. [`tools`] holds
//! the `get_weather` and `mul` executors, and [`ChatConfig`] loads settings
//! from the environment and an optional `toolchat.toml`.

pub mod chat_loop;
pub mod config;
pub mod error;
pub mod tools;

pub use chat_loop::ChatLoop;
pub use config::ChatConfig;
pub use error::ChatError;
