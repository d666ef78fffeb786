// Repository layer over the SQLite database

pub mod history_repo;
pub mod settings_repo;

pub use history_repo::HistoryRepository;
pub use settings_repo::SettingsRepository;
