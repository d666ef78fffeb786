// Content Service
//
// The three adapter operations: craft content generation, image analysis and
// free text generation. Each validates its inputs before touching the
// network, races the remote call against the caller's cancellation token and
// classifies failures exactly once.

use tokio_util::sync::CancellationToken;

use crate::models::content::{ImageSource, Language, ParsedContent};
use crate::services::ai::{
    craft_content_prompt, encode_image, parse_craft_response, AIError, AIErrorCode, AIResult,
    GenerateRequest, GenerationPreset, ModelTier, SharedBackend, ANALYSIS_PROMPT,
};

const MSG_MISSING_DESCRIPTION: &str = "Please provide a description for content generation.";
const MSG_MISSING_CRAFT_IMAGE: &str = "Please provide a craft image for analysis.";
const MSG_MISSING_IMAGE: &str = "Please provide an image for analysis.";
const MSG_MISSING_PROMPT: &str = "Please provide a prompt for text generation.";

/// Craft content operations over a generative backend
#[derive(Clone)]
pub struct ContentService {
    backend: SharedBackend,
}

impl ContentService {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    /// Generate story, social caption and heritage context for a craft photo
    pub async fn generate_craft_content(
        &self,
        prompt: &str,
        image: Option<&ImageSource>,
        language: Language,
        keywords: &[String],
        cancel: Option<&CancellationToken>,
    ) -> AIResult<ParsedContent> {
        let result = async {
            if prompt.trim().is_empty() {
                return Err(AIError::Validation(MSG_MISSING_DESCRIPTION.to_string()));
            }
            let image = image.ok_or_else(|| AIError::Validation(MSG_MISSING_CRAFT_IMAGE.to_string()))?;

            let inline = encode_image(image, cancel).await?;
            let request = GenerateRequest {
                prompt: craft_content_prompt(prompt, language, keywords),
                image: Some(inline),
                preset: GenerationPreset::CONTENT,
            };

            log::info!(
                "Generating craft content via {} (language={}, keywords={})",
                self.backend.name(),
                language,
                keywords.len()
            );
            let text = self.call_backend(ModelTier::Multimodal, request, cancel).await?;
            Ok(parse_craft_response(&text))
        }
        .await;

        result.map_err(|e| report_failure("generate_craft_content", e))
    }

    /// Describe a craft photo without generating marketing content
    pub async fn analyze_craft_image(
        &self,
        image: Option<&ImageSource>,
        cancel: Option<&CancellationToken>,
    ) -> AIResult<String> {
        let result = async {
            let image = image.ok_or_else(|| AIError::Validation(MSG_MISSING_IMAGE.to_string()))?;
            let inline = encode_image(image, cancel).await?;
            let request = GenerateRequest {
                prompt: ANALYSIS_PROMPT.to_string(),
                image: Some(inline),
                preset: GenerationPreset::ANALYSIS,
            };
            self.call_backend(ModelTier::Multimodal, request, cancel).await
        }
        .await;

        result.map_err(|e| report_failure("analyze_craft_image", e))
    }

    /// Plain text generation on the text tier
    pub async fn generate_text(
        &self,
        prompt: &str,
        cancel: Option<&CancellationToken>,
    ) -> AIResult<String> {
        let result = async {
            if prompt.trim().is_empty() {
                return Err(AIError::Validation(MSG_MISSING_PROMPT.to_string()));
            }
            let request = GenerateRequest {
                prompt: prompt.to_string(),
                image: None,
                preset: GenerationPreset::TEXT,
            };
            self.call_backend(ModelTier::Text, request, cancel).await
        }
        .await;

        result.map_err(|e| report_failure("generate_text", e))
    }

    /// Remote call raced against the cancellation token. The first to settle wins.
    async fn call_backend(
        &self,
        tier: ModelTier,
        request: GenerateRequest,
        cancel: Option<&CancellationToken>,
    ) -> AIResult<String> {
        let call = self.backend.generate(tier, request);
        match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(AIError::Cancelled),
                result = call => result,
            },
            None => call.await,
        }
    }
}

/// Classify once and log
fn report_failure(operation: &str, err: AIError) -> AIError {
    let err = err.classified();
    match err.code() {
        AIErrorCode::Cancelled => log::info!("{} cancelled", operation),
        AIErrorCode::Validation => log::debug!("{} rejected: {}", operation, err),
        code => log::error!("{} failed [{}]: {}", operation, code.as_str(), err),
    }
    err
}
