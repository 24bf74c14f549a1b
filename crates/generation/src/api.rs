//! REST client for the generation endpoint.
//!
//! Dispatches a parsed generation directive (plus collected images) to
//! the downstream generation service and reconciles its response into
//! exactly one [`DispatchOutcome`]. The dispatch always sets `noWait`:
//! the chat request runs under a bounded execution budget and must never
//! block on a multi-second generation job -- pending jobs hand a
//! `generation_id` back for the client to poll.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use skinny_core::directive::GenerationDirective;
use skinny_core::images::CollectedImage;

/// One image sent with a dispatch, bound to a purpose slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchImage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub purpose: String,
}

impl From<CollectedImage> for DispatchImage {
    fn from(image: CollectedImage) -> Self {
        Self {
            url: image.url,
            base64: image.base64,
            mime_type: image.mime_type,
            purpose: image.purpose.as_str().to_string(),
        }
    }
}

/// The POST body sent to the generation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    pub model: String,
    pub prompt: String,
    pub params: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequential_image_generation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_images: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<DispatchImage>,
    pub no_wait: bool,
}

impl DispatchRequest {
    /// Build the dispatch payload from a directive and collected images.
    pub fn from_directive(directive: GenerationDirective, images: Vec<CollectedImage>) -> Self {
        Self {
            model: directive.model,
            prompt: directive.prompt,
            params: directive.params,
            duration: directive.duration,
            resolution: directive.resolution,
            sequential_image_generation: directive.sequential_image_generation,
            max_images: directive.max_images,
            images: images.into_iter().map(DispatchImage::from).collect(),
            no_wait: true,
        }
    }
}

/// Identity headers copied from the inbound chat request and forwarded
/// to the generation endpoint unmodified. Never inspected or verified
/// here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityHeaders {
    pub authorization: Option<String>,
    pub user_id: Option<String>,
    pub cookie: Option<String>,
}

/// The three ways a dispatch can resolve.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The job finished synchronously.
    Complete {
        image_url: String,
        output_urls: Vec<String>,
    },
    /// The job was accepted and is running; the client polls with this id.
    Pending { generation_id: String },
    /// The service reported a failure (or an unrecognizable response).
    Failed {
        error: String,
        code: Option<String>,
        required: Option<f64>,
        available: Option<f64>,
    },
}

/// Errors from the dispatch layer itself (as opposed to failures the
/// service reported in a well-formed body, which become
/// [`DispatchOutcome::Failed`]).
#[derive(Debug, thiserror::Error)]
pub enum GenerationApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("Generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body was not JSON.
    #[error("Generation service returned an unreadable response: {0}")]
    MalformedResponse(String),
}

/// Seam between the relay and the generation service, so orchestration
/// can be exercised without a network.
#[async_trait]
pub trait GenerationDispatch: Send + Sync {
    async fn dispatch(
        &self,
        request: &DispatchRequest,
        identity: &IdentityHeaders,
    ) -> Result<DispatchOutcome, GenerationApiError>;
}

/// HTTP client for the generation endpoint.
pub struct GenerationApi {
    client: reqwest::Client,
    base_url: String,
}

impl GenerationApi {
    /// Create a client for the generation service base URL.
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
}

#[async_trait]
impl GenerationDispatch for GenerationApi {
    async fn dispatch(
        &self,
        request: &DispatchRequest,
        identity: &IdentityHeaders,
    ) -> Result<DispatchOutcome, GenerationApiError> {
        let mut builder = self
            .client
            .post(format!("{}/generations", self.base_url))
            .json(request);

        if let Some(authorization) = &identity.authorization {
            builder = builder.header("Authorization", authorization);
        }
        if let Some(user_id) = &identity.user_id {
            builder = builder.header("x-whop-user-id", user_id);
        }
        if let Some(cookie) = &identity.cookie {
            builder = builder.header("Cookie", cookie);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        // Error statuses still carry a reconcilable JSON body; a non-JSON
        // body is the only thing treated as a transport-level failure.
        let raw: RawDispatchResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(status = status.as_u16(), error = %e, "Unparseable dispatch response");
            GenerationApiError::MalformedResponse(format!("HTTP {status}: {e}"))
        })?;

        Ok(reconcile(raw))
    }
}

/// Superset of the response shapes the generation endpoint produces.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDispatchResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    pending: Option<bool>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    output_urls: Option<Vec<String>>,
    #[serde(default)]
    generation_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    required: Option<f64>,
    #[serde(default)]
    available: Option<f64>,
}

/// Map a raw response onto exactly one outcome.
///
/// `output_urls` is guaranteed to contain `image_url`: a missing or
/// empty list falls back to `[image_url]`, and a list the service
/// returned without it gets it prepended.
fn reconcile(raw: RawDispatchResponse) -> DispatchOutcome {
    if raw.success == Some(true) {
        if let Some(image_url) = raw.image_url {
            let mut output_urls = raw.output_urls.unwrap_or_default();
            if output_urls.is_empty() {
                output_urls.push(image_url.clone());
            } else if !output_urls.contains(&image_url) {
                output_urls.insert(0, image_url.clone());
            }
            return DispatchOutcome::Complete {
                image_url,
                output_urls,
            };
        }
    }

    if raw.pending == Some(true) {
        if let Some(generation_id) = raw.generation_id {
            return DispatchOutcome::Pending { generation_id };
        }
    }

    DispatchOutcome::Failed {
        error: raw
            .error
            .unwrap_or_else(|| "Generation failed with no error message".to_string()),
        code: raw.code,
        required: raw.required,
        available: raw.available,
    }
}
