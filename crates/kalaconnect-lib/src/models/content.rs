// Craft content data models
// Request inputs and the structured result of a generation call

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Maximum number of keywords accepted for a generation request
pub const MAX_KEYWORDS: usize = 2;

/// Fallback text used when the model reply has no usable story
pub const FALLBACK_STORY: &str =
    "Every handcrafted piece carries the patience and skill of the artisan who made it.";

/// Fallback text used when the model reply has no usable social caption
pub const FALLBACK_SOCIAL_CAPTION: &str = "Beautiful traditional Indian craft! 🎨✨ #IndianCrafts #TraditionalArt #CulturalHeritage #HandmadeWithLove";

/// Fallback text used when the model reply has no usable heritage context
pub const FALLBACK_HERITAGE_CONTEXT: &str = "This craft represents the rich heritage of Indian traditional artistry, passed down through generations.";

/// Target language for generated content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Ta,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Hi, Language::Ta];

    /// Short code stored in preferences ("en", "hi", "ta")
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Ta => "ta",
        }
    }

    /// English name used inside prompts
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Hi => "Hindi",
            Language::Ta => "Tamil",
        }
    }

    /// Name of the language in its own script
    pub fn native_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Hi => "हिंदी",
            Language::Ta => "தமிழ்",
        }
    }

    pub fn from_code(code: &str) -> Option<Language> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Language::En),
            "hi" => Some(Language::Hi),
            "ta" => Some(Language::Ta),
            _ => None,
        }
    }

    /// Lenient lookup: unknown codes fall back to English
    pub fn from_code_or_default(code: &str) -> Language {
        Self::from_code(code).unwrap_or_default()
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The three sections of a generated result
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ContentSection {
    Story,
    SocialCaption,
    HeritageContext,
}

impl ContentSection {
    pub const ALL: [ContentSection; 3] = [
        ContentSection::Story,
        ContentSection::SocialCaption,
        ContentSection::HeritageContext,
    ];

    /// Label the model is asked to prefix each section with
    pub fn label(&self) -> &'static str {
        match self {
            ContentSection::Story => "STORY:",
            ContentSection::SocialCaption => "SOCIAL_CAPTION:",
            ContentSection::HeritageContext => "HERITAGE_CONTEXT:",
        }
    }

    pub fn fallback_text(&self) -> &'static str {
        match self {
            ContentSection::Story => FALLBACK_STORY,
            ContentSection::SocialCaption => FALLBACK_SOCIAL_CAPTION,
            ContentSection::HeritageContext => FALLBACK_HERITAGE_CONTEXT,
        }
    }

    pub fn from_label(label: &str) -> Option<ContentSection> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }
}

/// Structured output of a craft content generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub story: String,
    pub social_caption: String,
    pub heritage_context: String,
}

impl GenerationResult {
    pub fn section(&self, section: ContentSection) -> &str {
        match section {
            ContentSection::Story => &self.story,
            ContentSection::SocialCaption => &self.social_caption,
            ContentSection::HeritageContext => &self.heritage_context,
        }
    }
}

/// How much of a generated result came from the model rather than fallback text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ParseOutcome {
    /// All three labeled sections were found with content
    Parsed,
    /// Some labels were found; the listed sections are genuine, the rest are fallback text
    PartiallyParsed { filled: Vec<ContentSection> },
    /// No labels; the first three blank-line separated paragraphs were used
    Paragraphs,
    /// No usable structure; the raw reply became the story
    Unparsed { raw: String },
}

/// Parsed reply with its provenance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParsedContent {
    #[serde(flatten)]
    pub result: GenerationResult,
    pub outcome: ParseOutcome,
}

impl ParsedContent {
    /// True when no fallback text was substituted
    pub fn is_trusted(&self) -> bool {
        matches!(self.outcome, ParseOutcome::Parsed | ParseOutcome::Paragraphs)
    }

    pub fn into_result(self) -> GenerationResult {
        self.result
    }
}

/// Where the craft photo comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Image file on disk, read when the request is built
    Path(PathBuf),
    /// Image already in memory, with the MIME type the uploader declared (if any)
    Bytes {
        data: Vec<u8>,
        mime_type: Option<String>,
        name: Option<String>,
    },
}

impl ImageSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        ImageSource::Path(path.into())
    }

    pub fn from_bytes(data: Vec<u8>, mime_type: Option<String>) -> Self {
        ImageSource::Bytes {
            data,
            mime_type,
            name: None,
        }
    }

    /// Human readable reference kept alongside saved content
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Bytes { name: Some(name), .. } => name.clone(),
            ImageSource::Bytes { data, .. } => format!("<{} bytes>", data.len()),
        }
    }
}

/// Split comma separated keyword input, trimming and capping at two entries
pub fn parse_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .take(MAX_KEYWORDS)
        .map(String::from)
        .collect()
}

/// Base prompt derived from the keyword list
pub fn derive_prompt(keywords: &[String]) -> String {
    if keywords.is_empty() {
        "Create comprehensive marketing content for this traditional craft".to_string()
    } else {
        format!("Create content focusing on: {}", keywords.join(", "))
    }
}

/// One generation call as assembled by the dashboard
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt_text: String,
    pub image: Option<ImageSource>,
    pub language: Language,
    pub keywords: Vec<String>,
}

impl GenerationRequest {
    /// Build a request from raw keyword input; the prompt is derived from the keywords
    pub fn new(image: ImageSource, language: Language, keyword_input: &str) -> Self {
        let keywords = parse_keywords(keyword_input);
        Self {
            prompt_text: derive_prompt(&keywords),
            image: Some(image),
            language,
            keywords,
        }
    }

    /// Override the derived prompt
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt_text = prompt.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keywords_caps_and_trims() {
        assert_eq!(parse_keywords("a, b, c"), vec!["a", "b"]);
        assert_eq!(parse_keywords("  madhubani painting ,silk weaving"), vec!["madhubani painting", "silk weaving"]);
        assert_eq!(parse_keywords(" , ,kundan,, meenakari, brass"), vec!["kundan", "meenakari"]);
        assert!(parse_keywords("").is_empty());
        assert!(parse_keywords(" ,  , ").is_empty());
    }

    #[test]
    fn test_derive_prompt() {
        assert_eq!(
            derive_prompt(&["terracotta".to_string(), "clay pottery".to_string()]),
            "Create content focusing on: terracotta, clay pottery"
        );
        assert_eq!(
            derive_prompt(&[]),
            "Create comprehensive marketing content for this traditional craft"
        );
    }

    #[test]
    fn test_language_codes() {
        for lang in Language::ALL {
            assert_eq!(Language::from_code(lang.code()), Some(lang));
        }
        assert_eq!(Language::from_code(" HI "), Some(Language::Hi));
        assert_eq!(Language::from_code("fr"), None);
        assert_eq!(Language::from_code_or_default("fr"), Language::En);
        assert_eq!(Language::Ta.display_name(), "Tamil");
    }

    #[test]
    fn test_language_serde() {
        assert_eq!(serde_json::to_string(&Language::Hi).unwrap(), "\"hi\"");
        let lang: Language = serde_json::from_str("\"ta\"").unwrap();
        assert_eq!(lang, Language::Ta);
    }

    #[test]
    fn test_generation_result_camel_case() {
        let parsed = ParsedContent {
            result: GenerationResult {
                story: "A".to_string(),
                social_caption: "B".to_string(),
                heritage_context: "C".to_string(),
            },
            outcome: ParseOutcome::Parsed,
        };
        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["story"], "A");
        assert_eq!(json["socialCaption"], "B");
        assert_eq!(json["heritageContext"], "C");
        assert_eq!(json["outcome"]["kind"], "parsed");
    }

    #[test]
    fn test_generation_request_new() {
        let req = GenerationRequest::new(ImageSource::from_path("/tmp/pot.jpg"), Language::Hi, "a, b, c");
        assert_eq!(req.keywords, vec!["a", "b"]);
        assert_eq!(req.prompt_text, "Create content focusing on: a, b");
        assert!(req.image.is_some());
    }

    #[test]
    fn test_section_labels() {
        assert_eq!(ContentSection::from_label("SOCIAL_CAPTION:"), Some(ContentSection::SocialCaption));
        assert_eq!(ContentSection::from_label("CAPTION:"), None);
    }
}
