//! Text-generation collaborator abstraction

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Sampling options passed through to the text-generation service
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationOptions {
    /// Sampling temperature
    pub temperature: f32,
    /// Top-k sampling cutoff
    pub top_k: u32,
    /// Nucleus sampling cutoff
    pub top_p: f32,
    /// Maximum number of output tokens
    pub max_output_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 8192,
        }
    }
}

/// A prompt together with its sampling options
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Full prompt text
    pub prompt: String,
    /// Sampling options
    pub options: GenerationOptions,
}

impl GenerationRequest {
    /// Create a request with default options
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            options: GenerationOptions::default(),
        }
    }

    /// Set the sampling options
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

/// Text fragments in arrival order; their concatenation is the full response
pub type ChunkStream = BoxStream<'static, Result<String>>;

/// Trait for text-generation services
///
/// Implementations report connection and protocol failures as
/// `Error::StreamTransport`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Get the name of this generator
    fn name(&self) -> &'static str;

    /// Generate the full response in one request
    async fn complete(&self, request: &GenerationRequest) -> Result<String>;

    /// Open a stream of response chunks
    ///
    /// Chunks are pulled one at a time, so the caller finishes with a chunk
    /// before the next one is requested.
    async fn open_stream(&self, request: &GenerationRequest) -> Result<ChunkStream>;
}
