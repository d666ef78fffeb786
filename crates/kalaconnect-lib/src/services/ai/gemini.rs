// Gemini Provider Implementation
//
// Google Gemini generateContent API. Requires an API key, sent in the
// x-goog-api-key header.
// Default endpoint: https://generativelanguage.googleapis.com/v1beta

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::{AIError, AIResult, GenerateRequest, GenerationPreset, GenerativeBackend, ModelTier};
use crate::config::GeminiConfig;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Harm categories covered by the request safety settings
const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

const BLOCK_THRESHOLD: &str = "BLOCK_LOW_AND_ABOVE";

/// Gemini Provider
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig, api_key: String) -> AIResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AIError::InvalidConfig(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            client,
            api_key,
        })
    }

    fn api_url(&self, model: &str) -> String {
        let base = self.config.endpoint.trim_end_matches('/');
        format!("{}/models/{}:generateContent", base, model)
    }

    fn content_headers(&self) -> AIResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| AIError::AuthFailed("API key contains invalid characters".to_string()))?;
        headers.insert(API_KEY_HEADER, key);
        Ok(headers)
    }
}

// Gemini API types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
    safety_settings: Vec<GeminiSafetySetting>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

/// Gemini part is either text or inline binary data
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiInlineData>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

impl From<GenerationPreset> for GeminiGenerationConfig {
    fn from(preset: GenerationPreset) -> Self {
        Self {
            temperature: preset.temperature,
            top_p: preset.top_p,
            top_k: preset.top_k,
            max_output_tokens: preset.max_output_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct GeminiSafetySetting {
    category: &'static str,
    threshold: &'static str,
}

fn safety_settings() -> Vec<GeminiSafetySetting> {
    HARM_CATEGORIES
        .iter()
        .map(|&category| GeminiSafetySetting {
            category,
            threshold: BLOCK_THRESHOLD,
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    prompt_feedback: Option<GeminiPromptFeedback>,
    usage_metadata: Option<GeminiUsageMetadata>,
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    total_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    code: Option<u16>,
    message: String,
    status: Option<String>,
}

fn build_request(request: GenerateRequest) -> GeminiRequest {
    let mut parts = Vec::with_capacity(2);
    if let Some(image) = request.image {
        parts.push(GeminiPart {
            text: None,
            inline_data: Some(GeminiInlineData {
                mime_type: image.mime_type,
                data: image.data,
            }),
        });
    }
    parts.push(GeminiPart {
        text: Some(request.prompt),
        inline_data: None,
    });

    GeminiRequest {
        contents: vec![GeminiContent {
            role: Some("user".to_string()),
            parts,
        }],
        generation_config: request.preset.into(),
        safety_settings: safety_settings(),
    }
}

/// Map a non-success HTTP response to an error
fn error_from_response(status: u16, body: &str) -> AIError {
    let detail = serde_json::from_str::<GeminiResponse>(body)
        .ok()
        .and_then(|r| r.error);

    let Some(error) = detail else {
        return match status {
            429 => AIError::RateLimited(format!("Gemini API error (429): {}", body)),
            401 | 403 => AIError::AuthFailed(format!("Gemini API error ({}): {}", status, body)),
            _ => AIError::ApiError(format!("Gemini API error ({}): {}", status, body)),
        };
    };

    let code = error.code.unwrap_or(status);
    let error_status = error.status.as_deref().unwrap_or("");

    if code == 429 || error_status == "RESOURCE_EXHAUSTED" {
        // Could be quota, billing, or rate limit
        log::warn!("Gemini RESOURCE_EXHAUSTED: {}", error.message);
        return AIError::RateLimited(error.message);
    }

    if code == 401
        || code == 403
        || error_status == "UNAUTHENTICATED"
        || error_status == "PERMISSION_DENIED"
        || error.message.contains("API key")
    {
        return AIError::AuthFailed(error.message);
    }

    if error.message.contains("SAFETY") {
        return AIError::SafetyBlocked(error.message);
    }

    AIError::ApiError(format!("Gemini API error ({}): {}", code, error.message))
}

/// Pull the reply text out of a successful response
fn extract_text(response: GeminiResponse) -> AIResult<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(AIError::SafetyBlocked(format!("prompt blocked ({})", reason)));
    }

    let candidate = response
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| AIError::ApiError("Gemini returned no candidates".to_string()))?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    match candidate.finish_reason.as_deref() {
        Some("SAFETY") if text.trim().is_empty() => Err(AIError::SafetyBlocked(
            "response blocked (finish reason SAFETY)".to_string(),
        )),
        Some("RECITATION") if text.trim().is_empty() => Err(AIError::ApiError(
            "response blocked (finish reason RECITATION)".to_string(),
        )),
        _ => Ok(text),
    }
}

#[async_trait]
impl GenerativeBackend for GeminiProvider {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn model(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Multimodal => &self.config.multimodal_model,
            ModelTier::Text => &self.config.text_model,
        }
    }

    async fn generate(&self, tier: ModelTier, request: GenerateRequest) -> AIResult<String> {
        let model = self.model(tier);
        let url = self.api_url(model);
        let has_image = request.image.is_some();
        let body = build_request(request);

        log::debug!(
            "Gemini request: model={} image={} prompt_chars={}",
            model,
            has_image,
            body.contents
                .iter()
                .flat_map(|c| c.parts.iter())
                .filter_map(|p| p.text.as_ref())
                .map(|t| t.chars().count())
                .sum::<usize>()
        );

        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .headers(self.content_headers()?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), &text));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&text)?;
        if let Some(usage) = &gemini_response.usage_metadata {
            log::debug!(
                "Gemini response in {}ms, tokens: {:?}",
                start.elapsed().as_millis(),
                usage.total_token_count
            );
        }

        extract_text(gemini_response)
    }
}
