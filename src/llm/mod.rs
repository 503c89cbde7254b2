//! Chat-completion client for content generation.
//!
//! The client speaks the OpenAI-compatible chat-completions protocol and
//! is deliberately tolerant of sloppy model output: responses are run
//! through a repair pipeline in [`parse`] before anything touches the
//! database.

pub mod client;
pub mod parse;
pub mod prompts;

pub use client::{LlmClient, LlmError};
pub use parse::{extract_json_payload, GeneratedContent};
