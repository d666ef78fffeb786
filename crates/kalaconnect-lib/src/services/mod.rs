// Services module

pub mod ai;
pub mod content;
pub mod history;
pub mod orchestrator;
pub mod preferences;

pub use content::ContentService;
pub use history::ContentHistory;
pub use orchestrator::{
    NoProgress, OrchestratorConfig, ProgressReporter, RequestOrchestrator, ScriptedProgress,
};
pub use preferences::{MemoryPreferenceStore, PreferenceStore, SessionPreferences};
