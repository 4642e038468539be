//! Language model access.
//!
//! - [`ModelClient`] is the seam to a remote model: one prompt in, raw text out.
//! - [`GeminiClient`] implements it over the Gemini `generateContent` REST API.
//! - [`LlmGateway`] builds the prompt from the instruction block and trimmed
//!   history, calls the client and turns any failure into a fallback reply.

pub mod api;
pub mod gateway;

pub use api::GeminiClient;
pub use gateway::{GatewayReply, LlmGateway, fallback_message};

use crate::error::Result;

/// A remote language model that completes a single prompt.
pub trait ModelClient: Send + Sync {
    /// Short name for logs (e.g. `"gemini"`).
    fn name(&self) -> &str;

    /// Complete `prompt`, returning the raw model text.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or a
    /// response without any text.
    fn generate(&self, prompt: &str) -> Result<String>;
}
