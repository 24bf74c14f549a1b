//! LLM provider client.
//!
//! Streams chat completions from a Gemini-style `streamGenerateContent`
//! endpoint: typed request/response shapes, SSE byte-stream decoding into
//! content deltas and usage metadata, and provider-error classification.

pub mod client;
pub mod error;
pub mod stream;
pub mod types;

pub use client::{ChatStreamRequest, LlmClient};
pub use error::LlmError;
pub use stream::{StreamUpdate, TokenUsage};
