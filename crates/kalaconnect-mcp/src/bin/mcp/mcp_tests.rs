//! Tests for the MCP server
//!
//! Covers tool categorization, input validation, parameter parsing and the
//! registered tool list.
//!
//! ```bash
//! cargo test --bin kalaconnect-mcp mcp_tests
//! ```

use super::security::{get_tool_category, validate_path, validate_string_length, ToolCategory};
use super::types::*;
use kalaconnect_lib::{HistorySort, Language};

const TOOLS: &[&str] = &[
    "generate_craft_content",
    "analyze_craft_image",
    "generate_text",
    "cancel_request",
    "get_processing_status",
    "list_content_history",
    "export_content_history",
    "delete_content",
    "get_preferences",
    "set_language",
];

// ============================================================================
// Tool Category Tests
// ============================================================================

#[cfg(test)]
mod tool_category_tests {
    use super::*;

    #[test]
    fn test_generation_tools_are_generate() {
        for tool in ["generate_craft_content", "analyze_craft_image", "generate_text"] {
            assert_eq!(get_tool_category(tool), ToolCategory::Generate, "{}", tool);
        }
    }

    #[test]
    fn test_read_and_write_tools() {
        assert_eq!(get_tool_category("list_content_history"), ToolCategory::ReadOnly);
        assert_eq!(get_tool_category("get_processing_status"), ToolCategory::ReadOnly);
        assert_eq!(get_tool_category("delete_content"), ToolCategory::Write);
        assert_eq!(get_tool_category("cancel_request"), ToolCategory::Write);
    }

    #[test]
    fn test_unknown_tool_defaults_to_generate() {
        assert_eq!(get_tool_category("unknown_tool"), ToolCategory::Generate);
        assert_eq!(get_tool_category(""), ToolCategory::Generate);
    }
}

// ============================================================================
// Validation Tests
// ============================================================================

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn test_validate_path_rejects_relative_and_empty() {
        assert!(validate_path("").is_err());
        assert!(validate_path("   ").is_err());
        assert!(validate_path("photos/pot.png").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_path_rejects_parent_segments() {
        assert!(validate_path("/home/artisan/../etc/passwd").is_err());
        assert!(validate_path("/tmp/pot\0.png").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_path_accepts_absolute() {
        let path = validate_path("  /home/artisan/pot.png ").unwrap();
        assert_eq!(path.to_str(), Some("/home/artisan/pot.png"));
    }

    #[test]
    fn test_string_length_counts_characters() {
        // Tamil text is multi-byte; the limit is on characters
        let tamil = "மண்பாண்டம்".repeat(10);
        assert!(validate_string_length(&tamil, "keywords", 100).is_ok());
        let err = validate_string_length(&"a".repeat(11), "prompt", 10).unwrap_err();
        assert!(err.contains("prompt is too long"));
    }
}

// ============================================================================
// Parameter Parsing Tests
// ============================================================================

#[cfg(test)]
mod params_tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_generate_params_defaults() {
        let params: GenerateCraftContentParams =
            serde_json::from_str(r#"{"image_path": "/tmp/pot.png"}"#).unwrap();
        assert_eq!(params.keywords, "");
        assert!(params.language.is_none());
        assert!(params.craft_type.is_none());
    }

    #[test]
    fn test_parse_language_is_strict() {
        assert_eq!(parse_language("TA").unwrap(), Language::Ta);
        assert_eq!(parse_language(" hi ").unwrap(), Language::Hi);
        assert!(parse_language("fr").unwrap_err().contains("Unsupported language"));
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort("newest").unwrap(), HistorySort::Newest);
        assert_eq!(parse_sort("").unwrap(), HistorySort::Newest);
        assert_eq!(parse_sort("oldest").unwrap(), HistorySort::Oldest);
        assert_eq!(parse_sort("craftType").unwrap(), HistorySort::CraftType);
        assert!(parse_sort("random").is_err());
    }

    #[test]
    fn test_history_params_to_filter() {
        let params: ListContentHistoryParams = serde_json::from_str(
            r#"{"query": " pottery ", "start_date": "2024-03-01", "end_date": "2024-03-31", "language": "ta", "sort": "oldest"}"#,
        )
        .unwrap();
        let (filter, sort) = params.to_filter().unwrap();

        assert_eq!(filter.query.as_deref(), Some("pottery"));
        assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(filter.end_date, NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(filter.language, Some(Language::Ta));
        assert!(filter.craft_type.is_none());
        assert_eq!(sort, HistorySort::Oldest);
    }

    #[test]
    fn test_history_params_blank_fields_are_ignored() {
        let params: ListContentHistoryParams =
            serde_json::from_str(r#"{"query": "  ", "craft_type": ""}"#).unwrap();
        let (filter, sort) = params.to_filter().unwrap();
        assert!(!filter.is_active());
        assert_eq!(sort, HistorySort::Newest);
    }

    #[test]
    fn test_history_params_bad_date() {
        let params: ListContentHistoryParams =
            serde_json::from_str(r#"{"start_date": "03/01/2024"}"#).unwrap();
        let err = params.to_filter().unwrap_err();
        assert!(err.contains("start_date"));
    }
}

// ============================================================================
// Tool Registration Tests
// ============================================================================

#[cfg(test)]
mod router_tests {
    use super::*;
    use crate::KalaConnectMcp;
    use kalaconnect_lib::services::RequestOrchestrator;
    use kalaconnect_lib::{AppConfig, Database, GeminiConfig, KalaConnect};

    fn server() -> KalaConnectMcp {
        let app = KalaConnect::with_parts(
            AppConfig {
                gemini: GeminiConfig::default(),
                api_key: None,
                data_dir: std::env::temp_dir(),
            },
            Database::in_memory().unwrap(),
            None,
            RequestOrchestrator::new(),
        );
        KalaConnectMcp::new(app)
    }

    #[test]
    fn test_all_tools_registered() {
        let server = server();
        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();

        let mut expected: Vec<String> = TOOLS.iter().map(|t| t.to_string()).collect();
        expected.sort();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_every_tool_has_a_category_entry() {
        // Tools missing from the category table fall through to Generate
        let generate = ["generate_craft_content", "analyze_craft_image", "generate_text"];
        for tool in TOOLS {
            if !generate.contains(tool) {
                assert_ne!(get_tool_category(tool), ToolCategory::Generate, "{}", tool);
            }
        }
    }
}
