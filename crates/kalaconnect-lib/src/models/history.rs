// Content history data models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::content::{ContentSection, GenerationResult, Language};

/// A previously generated piece of content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    /// Unique identifier (UUID v4)
    pub id: String,
    pub craft_type: String,
    pub keywords: Vec<String>,
    pub language: Language,
    /// Path or name of the source photo
    #[serde(default)]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub product_story: String,
    pub social_caption: String,
    pub cultural_context: String,
}

impl ContentRecord {
    /// Create a record for freshly generated content
    pub fn new(
        craft_type: String,
        keywords: Vec<String>,
        language: Language,
        image: Option<String>,
        result: &GenerationResult,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            craft_type,
            keywords,
            language,
            image,
            created_at: Utc::now(),
            product_story: result.story.clone(),
            social_caption: result.social_caption.clone(),
            cultural_context: result.heritage_context.clone(),
        }
    }

    pub fn section(&self, section: ContentSection) -> &str {
        match section {
            ContentSection::Story => &self.product_story,
            ContentSection::SocialCaption => &self.social_caption,
            ContentSection::HeritageContext => &self.cultural_context,
        }
    }

    /// Text for the clipboard: one section, or all three separated by blank lines
    pub fn copy_text(&self, section: Option<ContentSection>) -> String {
        match section {
            Some(section) => self.section(section).to_string(),
            None => format!(
                "{}\n\n{}\n\n{}",
                self.product_story, self.social_caption, self.cultural_context
            ),
        }
    }
}

/// Sort order for history listings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum HistorySort {
    #[default]
    Newest,
    Oldest,
    CraftType,
}

/// Filters applied to history listings. Empty fields match everything.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HistoryFilter {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Inclusive: covers the whole day
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub craft_type: Option<String>,
    #[serde(default)]
    pub language: Option<Language>,
}

impl HistoryFilter {
    pub fn is_active(&self) -> bool {
        self.query.as_deref().is_some_and(|q| !q.trim().is_empty())
            || self.start_date.is_some()
            || self.end_date.is_some()
            || self.craft_type.as_deref().is_some_and(|c| !c.trim().is_empty())
            || self.language.is_some()
    }
}

/// Entry written by the JSON export
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportedContent {
    pub craft_type: String,
    /// Comma separated
    pub keywords: String,
    pub language: Language,
    pub created_at: DateTime<Utc>,
    pub product_story: String,
    pub social_caption: String,
    pub cultural_context: String,
}

impl From<&ContentRecord> for ExportedContent {
    fn from(record: &ContentRecord) -> Self {
        Self {
            craft_type: record.craft_type.clone(),
            keywords: record.keywords.join(", "),
            language: record.language,
            created_at: record.created_at,
            product_story: record.product_story.clone(),
            social_caption: record.social_caption.clone(),
            cultural_context: record.cultural_context.clone(),
        }
    }
}
