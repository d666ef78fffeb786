// Application context
//
// Wires configuration, storage, the Gemini backend and the orchestrator into
// the caller-facing operations used by the MCP server.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::content::{GenerationRequest, ImageSource, ParsedContent};
use crate::models::history::ContentRecord;
use crate::models::processing::ProcessingState;
use crate::repositories::{HistoryRepository, SettingsRepository};
use crate::services::ai::{create_provider, AIError, AIResult, SharedBackend};
use crate::services::{
    ContentHistory, ContentService, RequestOrchestrator, SessionPreferences,
};
use crate::utils::database::{open_database, Database};

/// A generated result together with its saved history record.
/// `record` is None when saving to history failed; the content is still valid.
#[derive(Debug, Clone)]
pub struct GeneratedContent {
    pub content: ParsedContent,
    pub record: Option<ContentRecord>,
}

#[derive(Clone)]
pub struct KalaConnect {
    config: AppConfig,
    orchestrator: RequestOrchestrator,
    /// None when no API key is configured
    content: Option<ContentService>,
    history: ContentHistory,
    preferences: SessionPreferences,
}

impl KalaConnect {
    /// Open the database in the configured data directory and create the Gemini backend.
    /// A missing API key is not fatal here; generation calls report it.
    pub fn open(config: AppConfig) -> AIResult<Self> {
        let db = open_database(&config.data_dir).map_err(AIError::StorageError)?;

        let backend = match create_provider(config.gemini.clone(), config.api_key.clone()) {
            Ok(backend) => Some(backend),
            Err(AIError::AuthFailed(reason)) => {
                log::warn!("Gemini backend unavailable: {}", reason);
                None
            }
            Err(e) => return Err(e),
        };

        Ok(Self::with_parts(config, db, backend, RequestOrchestrator::new()))
    }

    /// Assemble from explicit parts
    pub fn with_parts(
        config: AppConfig,
        db: Database,
        backend: Option<SharedBackend>,
        orchestrator: RequestOrchestrator,
    ) -> Self {
        Self {
            config,
            orchestrator,
            content: backend.map(ContentService::new),
            history: ContentHistory::new(HistoryRepository::new(db.clone())),
            preferences: SessionPreferences::new(Arc::new(SettingsRepository::new(db))),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &RequestOrchestrator {
        &self.orchestrator
    }

    pub fn history(&self) -> &ContentHistory {
        &self.history
    }

    pub fn preferences(&self) -> &SessionPreferences {
        &self.preferences
    }

    pub fn content(&self) -> AIResult<&ContentService> {
        self.content.as_ref().ok_or_else(|| {
            AIError::AuthFailed(
                "Gemini API key is not configured (set GEMINI_API_KEY)".to_string(),
            )
        })
    }

    pub fn processing_state(&self) -> ProcessingState {
        self.orchestrator.state()
    }

    pub fn cancel_request(&self) -> bool {
        self.orchestrator.cancel_request()
    }

    /// Generate craft content as the in-flight request and save it to history
    pub async fn generate_craft_content(
        &self,
        request: GenerationRequest,
        craft_type: Option<&str>,
    ) -> AIResult<GeneratedContent> {
        let content = self.content()?.clone();
        let GenerationRequest {
            prompt_text,
            image,
            language,
            keywords,
        } = request;
        let image_ref = image.as_ref().map(ImageSource::describe);

        let parsed = {
            let keywords = keywords.clone();
            self.orchestrator
                .start_request(move |token| async move {
                    content
                        .generate_craft_content(&prompt_text, image.as_ref(), language, &keywords, Some(&token))
                        .await
                })
                .await?
        };

        let record = match self
            .history
            .record_generation(craft_type, &keywords, language, image_ref, &parsed.result)
        {
            Ok(record) => Some(record),
            Err(e) => {
                log::error!("Generated content not saved to history: {}", e);
                None
            }
        };

        Ok(GeneratedContent {
            content: parsed,
            record,
        })
    }

    /// Analyze a craft photo as the in-flight request
    pub async fn analyze_craft_image(&self, image: Option<ImageSource>) -> AIResult<String> {
        let content = self.content()?.clone();
        self.orchestrator
            .start_request(move |token| async move {
                content.analyze_craft_image(image.as_ref(), Some(&token)).await
            })
            .await
    }

    /// Text-only generation as the in-flight request
    pub async fn generate_text(&self, prompt: String) -> AIResult<String> {
        let content = self.content()?.clone();
        self.orchestrator
            .start_request(move |token| async move { content.generate_text(&prompt, Some(&token)).await })
            .await
    }
}
