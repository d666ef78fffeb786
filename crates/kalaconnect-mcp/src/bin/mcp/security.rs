//! Tool categorization and input validation for MCP tools

use std::path::{Path, PathBuf};

/// Longest prompt or description accepted from a tool call
pub const MAX_PROMPT_LENGTH: usize = 8_000;

/// Longest single filter or keyword string accepted from a tool call
pub const MAX_FIELD_LENGTH: usize = 500;

/// Tool category, used for request logging
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolCategory {
    /// Reads state or history
    ReadOnly,
    /// Changes preferences or history
    Write,
    /// Calls the Gemini service through the orchestrator
    Generate,
}

impl ToolCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::ReadOnly => "read_only",
            ToolCategory::Write => "write",
            ToolCategory::Generate => "generate",
        }
    }
}

pub fn get_tool_category(tool_name: &str) -> ToolCategory {
    match tool_name {
        "get_processing_status" | "list_content_history" | "get_preferences" => {
            ToolCategory::ReadOnly
        }
        "cancel_request" | "export_content_history" | "delete_content" | "set_language" => {
            ToolCategory::Write
        }
        "generate_craft_content" | "analyze_craft_image" | "generate_text" => {
            ToolCategory::Generate
        }
        // Unknown tools are treated as the most expensive kind
        _ => ToolCategory::Generate,
    }
}

/// Validate an image or directory path handed in by the client
pub fn validate_path(path: &str) -> Result<PathBuf, String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err("Path cannot be empty".to_string());
    }
    if trimmed.contains('\0') {
        return Err("Path contains invalid characters".to_string());
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(format!("Path must be absolute: {}", trimmed));
    }
    if path.components().any(|c| matches!(c, std::path::Component::ParentDir)) {
        return Err("Path must not contain '..' segments".to_string());
    }
    Ok(path.to_path_buf())
}

pub fn validate_string_length(value: &str, field: &str, max: usize) -> Result<(), String> {
    let len = value.chars().count();
    if len > max {
        return Err(format!(
            "{} is too long ({} characters, maximum {})",
            field, len, max
        ));
    }
    Ok(())
}
