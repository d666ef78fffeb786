// Content history service
//
// Saves generated content and serves filtered, sorted listings, bulk
// deletion, clipboard text and JSON export.

use chrono::{NaiveDate, NaiveTime, Utc};
use std::path::{Path, PathBuf};

use crate::models::content::{ContentSection, GenerationResult, Language};
use crate::models::history::{ContentRecord, ExportedContent, HistoryFilter, HistorySort};
use crate::repositories::HistoryRepository;

/// Craft type recorded when the caller gives none and there are no keywords
pub const DEFAULT_CRAFT_TYPE: &str = "Traditional Craft";

/// Craft type for a new record: explicit value, else the first keyword
pub fn derive_craft_type(explicit: Option<&str>, keywords: &[String]) -> String {
    explicit
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .or_else(|| keywords.first().map(String::as_str))
        .unwrap_or(DEFAULT_CRAFT_TYPE)
        .to_string()
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Whether a record passes every active filter
pub fn matches_filter(record: &ContentRecord, filter: &HistoryFilter) -> bool {
    if let Some(query) = filter.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let query = query.to_lowercase();
        let hit = contains_ci(&record.craft_type, &query)
            || record.keywords.iter().any(|k| contains_ci(k, &query))
            || contains_ci(&record.product_story, &query)
            || contains_ci(&record.social_caption, &query)
            || contains_ci(&record.cultural_context, &query);
        if !hit {
            return false;
        }
    }

    let created = record.created_at.naive_utc();
    if let Some(start) = filter.start_date {
        if created < start.and_time(NaiveTime::MIN) {
            return false;
        }
    }
    if let Some(end) = filter.end_date {
        // Inclusive of the whole end day
        if created.date() > end {
            return false;
        }
    }

    if let Some(craft) = filter.craft_type.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        if record.craft_type.to_lowercase() != craft.to_lowercase() {
            return false;
        }
    }

    if let Some(language) = filter.language {
        if record.language != language {
            return false;
        }
    }

    true
}

/// Apply filters, then sort
pub fn filter_and_sort(
    records: Vec<ContentRecord>,
    filter: &HistoryFilter,
    sort: HistorySort,
) -> Vec<ContentRecord> {
    let mut filtered: Vec<ContentRecord> = records
        .into_iter()
        .filter(|r| matches_filter(r, filter))
        .collect();

    match sort {
        HistorySort::Newest => filtered.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        HistorySort::Oldest => filtered.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        HistorySort::CraftType => filtered.sort_by(|a, b| {
            a.craft_type
                .to_lowercase()
                .cmp(&b.craft_type.to_lowercase())
                .then_with(|| a.craft_type.cmp(&b.craft_type))
        }),
    }

    filtered
}

/// Pretty-printed JSON export of the given records
pub fn export_json(records: &[ContentRecord]) -> Result<String, String> {
    let exported: Vec<ExportedContent> = records.iter().map(ExportedContent::from).collect();
    serde_json::to_string_pretty(&exported).map_err(|e| format!("Failed to export content: {}", e))
}

/// Export file name for a given day, e.g. `content-history-2024-03-01.json`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("content-history-{}.json", date.format("%Y-%m-%d"))
}

/// History operations over the repository
#[derive(Clone)]
pub struct ContentHistory {
    repo: HistoryRepository,
}

impl ContentHistory {
    pub fn new(repo: HistoryRepository) -> Self {
        Self { repo }
    }

    /// Save a freshly generated result
    pub fn record_generation(
        &self,
        craft_type: Option<&str>,
        keywords: &[String],
        language: Language,
        image: Option<String>,
        result: &GenerationResult,
    ) -> Result<ContentRecord, String> {
        let record = ContentRecord::new(
            derive_craft_type(craft_type, keywords),
            keywords.to_vec(),
            language,
            image,
            result,
        );
        self.repo.save(&record)?;
        log::debug!("Saved content record {} ({})", record.id, record.craft_type);
        Ok(record)
    }

    pub fn list(&self, filter: &HistoryFilter, sort: HistorySort) -> Result<Vec<ContentRecord>, String> {
        Ok(filter_and_sort(self.repo.list()?, filter, sort))
    }

    pub fn get(&self, id: &str) -> Result<Option<ContentRecord>, String> {
        self.repo.get(id)
    }

    pub fn delete(&self, id: &str) -> Result<bool, String> {
        self.repo.delete(id)
    }

    pub fn delete_many(&self, ids: &[String]) -> Result<usize, String> {
        let deleted = self.repo.delete_many(ids)?;
        log::info!("Deleted {} of {} content records", deleted, ids.len());
        Ok(deleted)
    }

    /// Clipboard text for one record
    pub fn copy_text(&self, id: &str, section: Option<ContentSection>) -> Result<String, String> {
        let record = self
            .repo
            .get(id)?
            .ok_or_else(|| format!("Content record not found: {}", id))?;
        Ok(record.copy_text(section))
    }

    /// Export the selected records, or everything when `ids` is None.
    /// Records are exported newest first; unknown ids are skipped.
    pub fn export(&self, ids: Option<&[String]>) -> Result<String, String> {
        let records = self.repo.list()?;
        let selected: Vec<ContentRecord> = match ids {
            Some(ids) => records.into_iter().filter(|r| ids.contains(&r.id)).collect(),
            None => records,
        };
        export_json(&selected)
    }

    /// Write an export into `dir` and return the file path
    pub fn export_to_dir(&self, ids: Option<&[String]>, dir: &Path) -> Result<PathBuf, String> {
        let json = self.export(ids)?;
        std::fs::create_dir_all(dir).map_err(|e| format!("Failed to create export directory: {}", e))?;
        let path = dir.join(export_file_name(Utc::now().date_naive()));
        std::fs::write(&path, json).map_err(|e| format!("Failed to write export: {}", e))?;
        Ok(path)
    }
}
