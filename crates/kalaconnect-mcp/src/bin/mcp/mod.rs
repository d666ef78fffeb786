//! MCP Server modules for KalaConnect
//!
//! Tool parameter types and request validation used by mcp_server.rs.

pub mod security;
pub mod types;

#[cfg(test)]
mod mcp_tests;

pub use security::{
    get_tool_category, validate_path, validate_string_length, ToolCategory, MAX_FIELD_LENGTH,
    MAX_PROMPT_LENGTH,
};
pub use types::*;
