// AI Service Error Types
//
// Every failure surfaced by the content adapter is one of these variants.
// Untyped provider failures are reclassified from their message text so the
// caller always sees one of the documented categories.

use thiserror::Error;

/// AI Service Error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AIError {
    /// Missing image, empty prompt or unusable upload. Raised before any network activity.
    #[error("{0}")]
    Validation(String),

    /// Remote service throttled the request
    #[error("API rate limit exceeded (429): {0}")]
    RateLimited(String),

    /// Remote service refused the request under its content policy
    #[error("Content blocked by SAFETY filters: {0}")]
    SafetyBlocked(String),

    /// The user aborted the request before it settled
    #[error("Request was cancelled by user.")]
    Cancelled,

    /// Request timeout
    #[error("AI service response timeout")]
    Timeout,

    /// Missing or invalid service credentials
    #[error("Invalid or missing API key: {0}")]
    AuthFailed(String),

    /// A request is already in flight on this orchestrator
    #[error("Another request is already in progress")]
    Busy,

    /// Cannot reach the service
    #[error("Cannot connect to AI service: {0}")]
    ConnectionFailed(String),

    /// API error from provider that has not been classified further
    #[error("AI service error: {0}")]
    ApiError(String),

    /// JSON parsing error
    #[error("Response parse error: {0}")]
    ParseError(String),

    /// IO error (reading the image upload)
    #[error("IO error: {0}")]
    IoError(String),

    /// Storage error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for AIError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AIError::Timeout
        } else if err.is_connect() {
            AIError::ConnectionFailed(err.to_string())
        } else {
            AIError::ApiError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AIError {
    fn from(err: serde_json::Error) -> Self {
        AIError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for AIError {
    fn from(err: std::io::Error) -> Self {
        AIError::IoError(err.to_string())
    }
}

/// Result type for AI operations
pub type AIResult<T> = Result<T, AIError>;

/// Error categories reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AIErrorCode {
    Validation,
    RateLimited,
    SafetyBlocked,
    Cancelled,
    Timeout,
    AuthFailed,
    Busy,
    Unknown,
}

impl AIErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AIErrorCode::Validation => "AI_VALIDATION",
            AIErrorCode::RateLimited => "AI_RATE_LIMITED",
            AIErrorCode::SafetyBlocked => "AI_SAFETY_BLOCKED",
            AIErrorCode::Cancelled => "AI_CANCELLED",
            AIErrorCode::Timeout => "AI_TIMEOUT",
            AIErrorCode::AuthFailed => "AI_AUTH_FAILED",
            AIErrorCode::Busy => "AI_BUSY",
            AIErrorCode::Unknown => "AI_UNKNOWN",
        }
    }

    /// Classify a raw error message by the substrings the Gemini SDK and API
    /// are known to produce. Checked in priority order; pure function of the text.
    pub fn classify(message: &str) -> AIErrorCode {
        if message.contains("429") {
            AIErrorCode::RateLimited
        } else if message.contains("SAFETY") {
            AIErrorCode::SafetyBlocked
        } else if message.contains("cancelled") {
            AIErrorCode::Cancelled
        } else if message.contains("timeout") {
            AIErrorCode::Timeout
        } else if message.contains("API key") {
            AIErrorCode::AuthFailed
        } else {
            AIErrorCode::Unknown
        }
    }

    /// Whether the user can reasonably retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AIErrorCode::RateLimited | AIErrorCode::Timeout | AIErrorCode::Cancelled | AIErrorCode::Busy
        )
    }
}

impl AIError {
    pub fn code(&self) -> AIErrorCode {
        match self {
            AIError::Validation(_) => AIErrorCode::Validation,
            AIError::RateLimited(_) => AIErrorCode::RateLimited,
            AIError::SafetyBlocked(_) => AIErrorCode::SafetyBlocked,
            AIError::Cancelled => AIErrorCode::Cancelled,
            AIError::Timeout => AIErrorCode::Timeout,
            AIError::AuthFailed(_) => AIErrorCode::AuthFailed,
            AIError::Busy => AIErrorCode::Busy,
            AIError::ConnectionFailed(msg)
            | AIError::ApiError(msg)
            | AIError::ParseError(msg)
            | AIError::IoError(msg)
            | AIError::StorageError(msg)
            | AIError::InvalidConfig(msg) => AIErrorCode::classify(msg),
        }
    }

    /// Rewrap an untyped error into the variant its message classifies as.
    /// Typed variants are returned unchanged.
    pub fn classified(self) -> AIError {
        match self.code() {
            AIErrorCode::RateLimited if !matches!(self, AIError::RateLimited(_)) => {
                AIError::RateLimited(self.to_string())
            }
            AIErrorCode::SafetyBlocked if !matches!(self, AIError::SafetyBlocked(_)) => {
                AIError::SafetyBlocked(self.to_string())
            }
            AIErrorCode::Cancelled => AIError::Cancelled,
            AIErrorCode::Timeout => AIError::Timeout,
            AIErrorCode::AuthFailed if !matches!(self, AIError::AuthFailed(_)) => {
                AIError::AuthFailed(self.to_string())
            }
            _ => self,
        }
    }

    /// Convert to a user-friendly error message for the frontend
    pub fn to_user_message(&self) -> String {
        match self.code() {
            AIErrorCode::Validation => self.to_string(),
            AIErrorCode::RateLimited => {
                "Rate limit exceeded. Please wait a moment before trying again.".to_string()
            }
            AIErrorCode::SafetyBlocked => {
                "Content was blocked by safety filters. Please modify your request.".to_string()
            }
            AIErrorCode::Cancelled => "Request was cancelled by user.".to_string(),
            AIErrorCode::Timeout => "Request timed out. Please try again.".to_string(),
            AIErrorCode::AuthFailed => {
                "API key is invalid or missing. Please check your configuration.".to_string()
            }
            AIErrorCode::Busy => {
                "A request is already in progress. Cancel it or wait for it to finish.".to_string()
            }
            AIErrorCode::Unknown => "An unexpected error occurred. Please try again.".to_string(),
        }
    }
}

impl From<AIError> for String {
    fn from(err: AIError) -> Self {
        err.to_user_message()
    }
}
