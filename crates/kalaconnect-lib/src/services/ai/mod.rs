// AI Service Module
//
// Gemini content adapter: prompt building, image encoding, the remote call
// and response parsing.

pub mod error;
pub mod gemini;
pub mod image;
pub mod parser;
pub mod prompt;

use async_trait::async_trait;
use std::sync::Arc;

pub use error::{AIError, AIErrorCode, AIResult};
pub use gemini::GeminiProvider;
pub use image::{encode_image, InlineImage, MAX_IMAGE_BYTES};
pub use parser::parse_craft_response;
pub use prompt::{craft_content_prompt, ANALYSIS_PROMPT};

use crate::config::GeminiConfig;

/// Which model a call is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Image + text input
    Multimodal,
    /// Text only
    Text,
}

/// Sampling parameters sent as `generationConfig`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationPreset {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl GenerationPreset {
    /// Craft content generation (story, caption, heritage)
    pub const CONTENT: GenerationPreset = GenerationPreset {
        temperature: 0.7,
        top_p: 0.8,
        top_k: 32,
        max_output_tokens: 2048,
    };

    /// Image analysis, kept closer to the facts
    pub const ANALYSIS: GenerationPreset = GenerationPreset {
        temperature: 0.3,
        top_p: 0.8,
        top_k: 32,
        max_output_tokens: 1024,
    };

    /// Free text generation
    pub const TEXT: GenerationPreset = GenerationPreset {
        temperature: 0.7,
        top_p: 0.8,
        top_k: 32,
        max_output_tokens: 2048,
    };
}

/// A single generation call
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub image: Option<InlineImage>,
    pub preset: GenerationPreset,
}

/// Trait for generative backends
/// Gemini is the production implementation; tests substitute their own
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Get the backend name
    fn name(&self) -> &str;

    /// Model identifier used for a tier
    fn model(&self, tier: ModelTier) -> &str;

    /// Send one request and return the reply text
    async fn generate(&self, tier: ModelTier, request: GenerateRequest) -> AIResult<String>;
}

/// Shared backend handle
pub type SharedBackend = Arc<dyn GenerativeBackend>;

/// Factory function to create the Gemini backend from config
///
/// Fails with `AuthFailed` when no API key is configured.
pub fn create_provider(config: GeminiConfig, api_key: Option<String>) -> AIResult<SharedBackend> {
    let key = api_key
        .map(|k| k.trim().to_string())
        .ok_or_else(|| AIError::AuthFailed("Gemini requires an API key".to_string()))?;
    if key.is_empty() {
        return Err(AIError::AuthFailed("Gemini API key cannot be empty".to_string()));
    }
    Ok(Arc::new(GeminiProvider::new(config, key)?))
}
