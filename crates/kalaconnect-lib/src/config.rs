// Application configuration
//
// Values come from the process environment, optionally seeded from a .env
// file. Every setting has a default except the Gemini API key.

use std::path::PathBuf;

/// App identifier used for the data directory
pub const APP_IDENTIFIER: &str = "kalaconnect";

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MULTIMODAL_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Environment variable names
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
/// Key name used by the web build, accepted as a fallback
pub const ENV_API_KEY_LEGACY: &str = "VITE_GEMINI_API_KEY";
pub const ENV_ENDPOINT: &str = "KALACONNECT_GEMINI_ENDPOINT";
pub const ENV_MULTIMODAL_MODEL: &str = "KALACONNECT_MULTIMODAL_MODEL";
pub const ENV_TEXT_MODEL: &str = "KALACONNECT_TEXT_MODEL";
pub const ENV_TIMEOUT_SECS: &str = "KALACONNECT_REQUEST_TIMEOUT_SECS";
pub const ENV_DATA_DIR: &str = "KALACONNECT_DATA_DIR";

/// Gemini connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub endpoint: String,
    /// Model for image + text requests
    pub multimodal_model: String,
    /// Model for text-only requests
    pub text_model: String,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            multimodal_model: DEFAULT_MULTIMODAL_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub api_key: Option<String>,
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Load `.env` (if present) and read the environment
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let timeout_secs = match get(ENV_TIMEOUT_SECS) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(format!(
                        "{} must be a positive number of seconds, got '{}'",
                        ENV_TIMEOUT_SECS, raw
                    ))
                }
            },
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        let data_dir = match get(ENV_DATA_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        Ok(Self {
            gemini: GeminiConfig {
                endpoint: get(ENV_ENDPOINT).unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.to_string()),
                multimodal_model: get(ENV_MULTIMODAL_MODEL)
                    .unwrap_or_else(|| DEFAULT_MULTIMODAL_MODEL.to_string()),
                text_model: get(ENV_TEXT_MODEL).unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
                timeout_secs,
            },
            api_key: get(ENV_API_KEY).or_else(|| get(ENV_API_KEY_LEGACY)),
            data_dir,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Get the application data directory
pub fn default_data_dir() -> Result<PathBuf, String> {
    dirs::data_dir()
        .map(|p| p.join(APP_IDENTIFIER))
        .ok_or_else(|| "Could not determine application data directory".to_string())
}
