//! Type definitions for MCP tool parameters and responses
//!
//! Tool inputs derive `JsonSchema` so rmcp can publish their schemas.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use kalaconnect_lib::{ContentRecord, HistoryFilter, HistorySort, Language, ProcessingState};

// ============================================================================
// Default Value Helper Functions
// ============================================================================

pub fn default_sort() -> String {
    "newest".to_string()
}

pub fn default_keywords() -> String {
    String::new()
}

// ============================================================================
// Parameter Types for Tools (must derive JsonSchema)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerateCraftContentParams {
    /// Absolute path to the craft photo (PNG, JPEG, WEBP, GIF, HEIC)
    pub image_path: String,
    /// Comma-separated keywords, e.g. "terracotta, wheel thrown". Only the first two are used.
    #[serde(default = "default_keywords")]
    pub keywords: String,
    /// Output language code: en, hi or ta. Defaults to the saved preference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Optional description that replaces the prompt derived from keywords
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Optional craft type saved with the history record (defaults to the first keyword)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub craft_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzeCraftImageParams {
    /// Absolute path to the craft photo to analyze
    pub image_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerateTextParams {
    /// Prompt for text-only generation
    pub prompt: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct EmptyParams {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListContentHistoryParams {
    /// Case-insensitive text matched against craft type, keywords and generated text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Earliest creation date (YYYY-MM-DD, inclusive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Latest creation date (YYYY-MM-DD, the whole day is included)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Craft type filter (case-insensitive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub craft_type: Option<String>,
    /// Language filter: en, hi or ta
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Sort order: newest (default), oldest or craftType
    #[serde(default = "default_sort")]
    pub sort: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExportContentHistoryParams {
    /// Record IDs to export. Omit to export everything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    /// Directory to write content-history-YYYY-MM-DD.json into. Omit to return the JSON inline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeleteContentParams {
    /// Record IDs to delete
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SetLanguageParams {
    /// Language code: en, hi or ta
    pub language: String,
}

/// Strict language lookup for tool input
pub fn parse_language(code: &str) -> Result<Language, String> {
    Language::from_code(code)
        .ok_or_else(|| format!("Unsupported language '{}'. Use en, hi or ta.", code))
}

pub fn parse_sort(sort: &str) -> Result<HistorySort, String> {
    match sort.trim() {
        "" | "newest" => Ok(HistorySort::Newest),
        "oldest" => Ok(HistorySort::Oldest),
        "craftType" | "craft_type" => Ok(HistorySort::CraftType),
        other => Err(format!(
            "Unknown sort '{}'. Use newest, oldest or craftType.",
            other
        )),
    }
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("{} must be a date in YYYY-MM-DD format", field))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ListContentHistoryParams {
    pub fn to_filter(&self) -> Result<(HistoryFilter, HistorySort), String> {
        let filter = HistoryFilter {
            query: non_empty(&self.query).map(String::from),
            start_date: non_empty(&self.start_date)
                .map(|d| parse_date(d, "start_date"))
                .transpose()?,
            end_date: non_empty(&self.end_date)
                .map(|d| parse_date(d, "end_date"))
                .transpose()?,
            craft_type: non_empty(&self.craft_type).map(String::from),
            language: non_empty(&self.language).map(parse_language).transpose()?,
        };
        Ok((filter, parse_sort(&self.sort)?))
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Progress snapshot returned by get_processing_status
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStatusResponse {
    #[serde(flatten)]
    pub state: ProcessingState,
    pub gemini_configured: bool,
}

/// History listing with its match count
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryListResponse {
    pub records: Vec<ContentRecord>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesResponse {
    pub language: String,
    pub language_name: String,
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}
