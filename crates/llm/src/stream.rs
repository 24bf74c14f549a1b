//! SSE byte-stream decoding.
//!
//! The provider streams `data: <json>` frames over a chunked HTTP
//! response. Chunk boundaries do not respect frame boundaries, so the
//! decoder keeps a carry buffer and only yields payloads for complete
//! lines.

use crate::error::LlmError;

/// Aggregated token counts for one completed stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub response_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Whether there is anything worth recording.
    pub fn is_zero(&self) -> bool {
        self.total_tokens == 0
    }
}

/// One update surfaced to the relay from the provider stream.
#[derive(Debug)]
pub enum StreamUpdate {
    /// A text delta, in arrival order.
    Content(String),
    /// Usage metadata observed on the stream (sent once, before `Done`).
    Usage(TokenUsage),
    /// The provider stream failed; terminal.
    Error(LlmError),
    /// The provider stream ended normally; terminal.
    Done,
}

/// Incremental decoder for an SSE byte stream.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of response bytes; returns the `data:` payloads of
    /// every line completed by this chunk.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(data) = line.strip_prefix("data:") {
                payloads.push(data.trim_start().to_string());
            }
            // Comment lines (": keep-alive") and event/id fields are ignored.
        }
        payloads
    }
}
