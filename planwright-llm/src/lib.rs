//! Planwright LLM - text-generation API access for Planwright
//!
//! This crate provides the HTTP client that implements the core's
//! `TextGenerator` trait, including server-sent event streaming.

mod client;
mod error;
mod sse;

pub use client::GeminiClient;
pub use error::{LlmError, Result};
pub use sse::SseDecoder;
