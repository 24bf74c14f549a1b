//! Streaming client for the LLM provider.
//!
//! [`LlmClient::stream_generate`] issues the streaming request and hands
//! back an `mpsc::Receiver` of [`StreamUpdate`]s driven by a spawned
//! reader task. Pre-stream failures (bad key, unknown model) surface as
//! an `Err` from the call itself; mid-stream failures arrive as a
//! terminal [`StreamUpdate::Error`].

use futures::StreamExt;
use tokio::sync::mpsc;

use skinny_core::chat::ChatMessage;

use crate::error::{classify_provider_error, LlmError};
use crate::stream::{SseDecoder, StreamUpdate, TokenUsage};
use crate::types::{build_contents, Content, GenerateContentRequest, StreamChunk};

/// Channel capacity between the reader task and the relay.
const UPDATE_BUFFER: usize = 100;

/// HTTP client for one LLM provider endpoint.
pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
}

/// Everything needed to start one streaming chat completion.
pub struct ChatStreamRequest {
    /// Provider model id, e.g. `gemini-2.5-flash`.
    pub model: String,
    pub api_key: String,
    pub system_instruction: String,
    pub messages: Vec<ChatMessage>,
}

impl LlmClient {
    /// Create a client for a provider base URL
    /// (e.g. `https://generativelanguage.googleapis.com`).
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        )
    }

    /// Start a streaming generation.
    ///
    /// Returns the update receiver once the provider has accepted the
    /// request. The spawned reader task forwards content deltas in
    /// arrival order, surfaces usage metadata once, and always
    /// terminates the channel with `Done` or `Error`.
    pub async fn stream_generate(
        &self,
        request: ChatStreamRequest,
    ) -> Result<mpsc::Receiver<StreamUpdate>, LlmError> {
        let body = GenerateContentRequest {
            system_instruction: Some(Content::system(&request.system_instruction)),
            contents: build_contents(&request.messages),
        };

        let response = self
            .client
            .post(self.stream_url(&request.model))
            .header("x-goog-api-key", &request.api_key)
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                model = %request.model,
                "Provider rejected streaming request"
            );
            return Err(classify_provider_error(
                status.as_u16(),
                &body,
                &request.model,
            ));
        }

        let (tx, rx) = mpsc::channel(UPDATE_BUFFER);
        tokio::spawn(read_stream(response, tx));
        Ok(rx)
    }
}

/// Reader task: decode the SSE byte stream and forward updates until the
/// stream ends or the receiver goes away.
async fn read_stream(response: reqwest::Response, tx: mpsc::Sender<StreamUpdate>) {
    let mut stream = response.bytes_stream();
    let mut decoder = SseDecoder::new();
    let mut usage: Option<TokenUsage> = None;

    while let Some(chunk_result) = stream.next().await {
        let chunk = match chunk_result {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::error!(error = %e, "Provider stream read error");
                let _ = tx.send(StreamUpdate::Error(LlmError::Request(e))).await;
                return;
            }
        };

        for payload in decoder.feed(&String::from_utf8_lossy(&chunk)) {
            // OpenAI-compatible endpoints terminate with an explicit
            // sentinel; Gemini just closes the stream.
            if payload == "[DONE]" {
                continue;
            }
            match serde_json::from_str::<StreamChunk>(&payload) {
                Ok(parsed) => {
                    if let Some(delta) = parsed.text_delta() {
                        if tx.send(StreamUpdate::Content(delta)).await.is_err() {
                            // Receiver dropped (client disconnected).
                            return;
                        }
                    }
                    if let Some(meta) = parsed.usage_metadata {
                        usage = Some(TokenUsage {
                            prompt_tokens: meta.prompt_token_count,
                            response_tokens: meta.candidates_token_count,
                            total_tokens: meta.total_token_count,
                        });
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping unparseable stream chunk");
                }
            }
        }
    }

    if let Some(usage) = usage {
        let _ = tx.send(StreamUpdate::Usage(usage)).await;
    }
    let _ = tx.send(StreamUpdate::Done).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_url_targets_the_model() {
        let client = LlmClient::new("https://generativelanguage.googleapis.com".to_string());
        assert_eq!(
            client.stream_url("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );
    }
}
