// KalaConnect Shared Library
//
// Craft content generation core: the Gemini content adapter, the cancellable
// request orchestrator, preferences and content history.

pub mod app;
pub mod config;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

pub use app::{GeneratedContent, KalaConnect};
pub use config::{AppConfig, GeminiConfig};
pub use models::*;
pub use services::ai::{AIError, AIErrorCode, AIResult};
pub use utils::database::Database;
