//! Generation dispatch client.
//!
//! Wraps the downstream generation endpoint: typed dispatch payloads,
//! identity-header forwarding, outcome reconciliation
//! (immediate / pending / failed), and the generation status event
//! vocabulary streamed back to chat clients.

pub mod api;
pub mod events;

pub use api::{
    DispatchImage, DispatchOutcome, DispatchRequest, GenerationApi, GenerationApiError,
    GenerationDispatch, IdentityHeaders,
};
pub use events::{GenerationFrame, GenerationStatus};
