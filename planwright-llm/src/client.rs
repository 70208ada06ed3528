//! Gemini API client
//!
//! Implements `TextGenerator` against the `generateContent` and
//! `streamGenerateContent` endpoints.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::StreamExt;
use planwright_core::generate::{ChunkStream, GenerationRequest, TextGenerator};
use planwright_core::{ModelConfig, Secrets};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

use crate::sse::SseDecoder;
use crate::{LlmError, Result};

/// Gemini API client
pub struct GeminiClient {
    http: Client,
    base_url: Url,
    model: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a client with an explicit API key
    pub fn new(config: &ModelConfig, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let mut base_url = Url::parse(&config.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder().timeout(config.timeout).build()?;

        info!(base_url = %base_url, model = %config.model, "Created Gemini client");

        Ok(Self {
            http,
            base_url,
            model: config.model.clone(),
            api_key,
        })
    }

    /// Create a client, loading the API key from the environment or secrets file
    pub fn from_config(config: &ModelConfig, secrets: &Secrets) -> Result<Self> {
        let api_key = secrets.api_key().ok_or(LlmError::MissingApiKey)?;
        Self::new(config, api_key)
    }

    /// Replace the HTTP client, e.g. to change proxy or TLS settings
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    /// Model name sent with each request
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, method: &str, streaming: bool) -> Result<Url> {
        let mut url = self
            .base_url
            .join(&format!("v1beta/models/{}:{}", self.model, method))?;
        if streaming {
            url.query_pairs_mut().append_pair("alt", "sse");
        }
        Ok(url)
    }

    async fn post(&self, url: Url, request: &GenerationRequest) -> Result<reqwest::Response> {
        debug!(url = %url, prompt_len = request.prompt.len(), "Sending generation request");

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request_body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            let err = LlmError::Api {
                status: status.as_u16(),
                message,
            };
            if err.is_rate_limit() {
                warn!("Generation request rate limited by the service");
            } else {
                debug!(status = status.as_u16(), "Generation request rejected");
            }
            return Err(err);
        }
        Ok(response)
    }

    async fn complete_text(&self, request: &GenerationRequest) -> Result<String> {
        let url = self.endpoint("generateContent", false)?;
        let response = self.post(url, request).await?;
        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        body.text()
    }

    async fn stream_text(&self, request: &GenerationRequest) -> Result<ChunkStream> {
        let url = self.endpoint("streamGenerateContent", true)?;
        let response = self.post(url, request).await?;
        Ok(decode_stream(response.bytes_stream()))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn complete(&self, request: &GenerationRequest) -> planwright_core::Result<String> {
        Ok(self.complete_text(request).await?)
    }

    async fn open_stream(&self, request: &GenerationRequest) -> planwright_core::Result<ChunkStream> {
        Ok(self.stream_text(request).await?)
    }
}

/// Build the JSON request body
fn build_request_body(request: &GenerationRequest) -> serde_json::Value {
    let options = &request.options;
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.prompt }],
        }],
        "generationConfig": {
            "temperature": options.temperature,
            "topK": options.top_k,
            "topP": options.top_p,
            "maxOutputTokens": options.max_output_tokens,
        },
    })
}

/// Turn an SSE byte stream into text chunks
///
/// The stream ends after the first error.
fn decode_stream<S, B>(bytes: S) -> ChunkStream
where
    S: futures::Stream<Item = reqwest::Result<B>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    struct State<T> {
        bytes: T,
        decoder: SseDecoder,
        pending: VecDeque<Result<String>>,
        finished: bool,
    }

    impl<T> State<T> {
        fn queue(&mut self, payload: String) {
            match parse_event(&payload) {
                Ok(text) if text.is_empty() => {}
                other => self.pending.push_back(other),
            }
        }
    }

    let state = State {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                if item.is_err() {
                    state.finished = true;
                    state.pending.clear();
                }
                return Some((item.map_err(planwright_core::Error::from), state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for payload in state.decoder.push(chunk.as_ref()) {
                        state.queue(payload);
                    }
                }
                Some(Err(e)) => {
                    state.pending.push_back(Err(LlmError::Network(e)));
                }
                None => {
                    state.finished = true;
                    if let Some(payload) = state.decoder.finish() {
                        state.queue(payload);
                    }
                }
            }
        }
    })
    .boxed()
}

fn parse_event(payload: &str) -> Result<String> {
    let event: GenerateContentResponse = serde_json::from_str(payload)
        .map_err(|e| LlmError::InvalidResponse(format!("bad stream event: {}", e)))?;
    event.text()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> Result<String> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(LlmError::InvalidResponse(format!(
                "prompt was blocked: {}",
                reason
            )));
        }

        Ok(self
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default())
    }
}
