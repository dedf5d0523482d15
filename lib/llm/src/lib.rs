//! # fincabot-llm
//!
//! Response generation for the fincabot assistant: a [`ResponseGenerator`]
//! consumes a user query plus its ranked listing matches and returns a
//! prose recommendation. Two HTTP clients are provided - an
//! OpenAI-compatible chat-completions client and an Anthropic messages
//! client - sharing one prompt builder so switching providers does not
//! change what the model sees.

pub mod claude;
pub mod error;
pub mod handler;
pub mod openai;
pub mod prompt;

pub use claude::{ClaudeConfig, ClaudeGenerator};
pub use error::LlmError;
pub use handler::ResponseGenerator;
pub use openai::{OpenAiConfig, OpenAiGenerator};
