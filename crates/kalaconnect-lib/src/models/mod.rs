// Data models shared by services, repositories and the MCP server

pub mod content;
pub mod history;
pub mod processing;

pub use content::{
    derive_prompt, parse_keywords, ContentSection, GenerationRequest, GenerationResult,
    ImageSource, Language, ParseOutcome, ParsedContent,
};
pub use history::{ContentRecord, ExportedContent, HistoryFilter, HistorySort};
pub use processing::{ProcessingState, ProgressStage};
