// KalaConnect MCP Server
// Exposes craft content generation, request cancellation and content history
// to AI assistants over MCP (Model Context Protocol).
//
// Run with: cargo run --bin kalaconnect-mcp
// Configuration comes from the environment (or a .env file): GEMINI_API_KEY,
// KALACONNECT_DATA_DIR, KALACONNECT_GEMINI_ENDPOINT and friends.

mod mcp;

use std::time::Instant;

use rmcp::{
    ErrorData as McpError,
    ServerHandler,
    handler::server::tool::{ToolCallContext, ToolRouter},
    handler::server::wrapper::Parameters,
    model::*,
    service::RequestContext,
    tool, tool_router,
};
use serde::Serialize;
use tokio::io::{stdin, stdout};
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tracing_subscriber::EnvFilter;

use kalaconnect_lib::{AIError, AppConfig, GenerationRequest, ImageSource, KalaConnect, Language};

use mcp::{
    get_tool_category, parse_language, validate_path, validate_string_length,
    AnalyzeCraftImageParams, DeleteContentParams, EmptyParams, ExportContentHistoryParams,
    GenerateCraftContentParams, GenerateTextParams, HistoryListResponse, ListContentHistoryParams,
    PreferencesResponse, ProcessingStatusResponse, SetLanguageParams, MAX_FIELD_LENGTH,
    MAX_PROMPT_LENGTH,
};

/// Serialize a response payload as pretty JSON text content
fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Tool-level failure the client can show to the user
fn error_result(message: impl Into<String>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(message.into())])
}

/// Classified generation failure with its stable code
fn ai_error_result(err: &AIError) -> CallToolResult {
    let code = err.code();
    let body = serde_json::json!({
        "code": code.as_str(),
        "message": err.to_user_message(),
        "retryable": code.is_retryable(),
    });
    CallToolResult::error(vec![Content::text(body.to_string())])
}

#[derive(Clone)]
pub struct KalaConnectMcp {
    app: KalaConnect,
    tool_router: ToolRouter<Self>,
}

impl KalaConnectMcp {
    pub fn new(app: KalaConnect) -> Self {
        Self {
            app,
            tool_router: Self::tool_router(),
        }
    }

    /// Explicit language if given, otherwise the saved preference
    fn resolve_language(&self, requested: Option<&str>) -> Result<Language, String> {
        match requested.map(str::trim).filter(|l| !l.is_empty()) {
            Some(code) => parse_language(code),
            None => Ok(self.app.preferences().language().unwrap_or_else(|e| {
                tracing::warn!("Failed to read language preference: {}", e);
                Language::default()
            })),
        }
    }
}

#[tool_router]
impl KalaConnectMcp {
    // ========================================================================
    // Generation Tools
    // ========================================================================

    #[tool(description = "Generate a product story, social media caption and cultural heritage context for a craft photo. Runs as the single in-flight request; a second call while one is running fails with code AI_BUSY.")]
    async fn generate_craft_content(
        &self,
        Parameters(params): Parameters<GenerateCraftContentParams>,
    ) -> Result<CallToolResult, McpError> {
        let path = match validate_path(&params.image_path) {
            Ok(path) => path,
            Err(e) => return Ok(error_result(format!("Invalid image_path: {}", e))),
        };
        if let Err(e) = validate_string_length(&params.keywords, "keywords", MAX_FIELD_LENGTH) {
            return Ok(error_result(e));
        }
        if let Some(prompt) = params.prompt.as_deref() {
            if let Err(e) = validate_string_length(prompt, "prompt", MAX_PROMPT_LENGTH) {
                return Ok(error_result(e));
            }
        }
        let language = match self.resolve_language(params.language.as_deref()) {
            Ok(language) => language,
            Err(e) => return Ok(error_result(e)),
        };

        let mut request =
            GenerationRequest::new(ImageSource::from_path(path), language, &params.keywords);
        if let Some(prompt) = params.prompt.as_deref().filter(|p| !p.trim().is_empty()) {
            request = request.with_prompt(prompt);
        }

        match self
            .app
            .generate_craft_content(request, params.craft_type.as_deref())
            .await
        {
            Ok(generated) => {
                let trusted = generated.content.is_trusted();
                json_result(&serde_json::json!({
                    "content": generated.content,
                    "trusted": trusted,
                    "record": generated.record,
                }))
            }
            Err(e) => Ok(ai_error_result(&e)),
        }
    }

    #[tool(description = "Describe a craft photo: craft type, materials, techniques, colors and cultural significance.")]
    async fn analyze_craft_image(
        &self,
        Parameters(params): Parameters<AnalyzeCraftImageParams>,
    ) -> Result<CallToolResult, McpError> {
        let path = match validate_path(&params.image_path) {
            Ok(path) => path,
            Err(e) => return Ok(error_result(format!("Invalid image_path: {}", e))),
        };

        match self.app.analyze_craft_image(Some(ImageSource::from_path(path))).await {
            Ok(analysis) => json_result(&serde_json::json!({ "analysis": analysis })),
            Err(e) => Ok(ai_error_result(&e)),
        }
    }

    #[tool(description = "Text-only generation with the fast Gemini model.")]
    async fn generate_text(
        &self,
        Parameters(params): Parameters<GenerateTextParams>,
    ) -> Result<CallToolResult, McpError> {
        if let Err(e) = validate_string_length(&params.prompt, "prompt", MAX_PROMPT_LENGTH) {
            return Ok(error_result(e));
        }

        match self.app.generate_text(params.prompt).await {
            Ok(text) => json_result(&serde_json::json!({ "text": text })),
            Err(e) => Ok(ai_error_result(&e)),
        }
    }

    // ========================================================================
    // Request State Tools
    // ========================================================================

    #[tool(description = "Cancel the in-flight generation request. Returns cancelled=false when nothing was running.")]
    async fn cancel_request(
        &self,
        Parameters(_params): Parameters<EmptyParams>,
    ) -> Result<CallToolResult, McpError> {
        let cancelled = self.app.cancel_request();
        json_result(&serde_json::json!({
            "cancelled": cancelled,
            "state": self.app.processing_state(),
        }))
    }

    #[tool(description = "Get the current processing state: whether a request is running, its stage label and progress percentage.")]
    async fn get_processing_status(
        &self,
        Parameters(_params): Parameters<EmptyParams>,
    ) -> Result<CallToolResult, McpError> {
        json_result(&ProcessingStatusResponse {
            state: self.app.processing_state(),
            gemini_configured: self.app.content().is_ok(),
        })
    }

    // ========================================================================
    // Content History Tools
    // ========================================================================

    #[tool(description = "List saved content with optional text, date range, craft type and language filters.")]
    async fn list_content_history(
        &self,
        Parameters(params): Parameters<ListContentHistoryParams>,
    ) -> Result<CallToolResult, McpError> {
        if let Some(query) = params.query.as_deref() {
            if let Err(e) = validate_string_length(query, "query", MAX_FIELD_LENGTH) {
                return Ok(error_result(e));
            }
        }
        let (filter, sort) = match params.to_filter() {
            Ok(parsed) => parsed,
            Err(e) => return Ok(error_result(e)),
        };

        let records = self
            .app
            .history()
            .list(&filter, sort)
            .map_err(|e| McpError::internal_error(e, None))?;
        let total = records.len();
        json_result(&HistoryListResponse { records, total })
    }

    #[tool(description = "Export saved content as JSON, either inline or as content-history-YYYY-MM-DD.json in a directory.")]
    async fn export_content_history(
        &self,
        Parameters(params): Parameters<ExportContentHistoryParams>,
    ) -> Result<CallToolResult, McpError> {
        let ids = params.ids.as_deref();
        match params.output_dir.as_deref() {
            Some(dir) => {
                let dir = match validate_path(dir) {
                    Ok(dir) => dir,
                    Err(e) => return Ok(error_result(format!("Invalid output_dir: {}", e))),
                };
                match self.app.history().export_to_dir(ids, &dir) {
                    Ok(file) => json_result(&serde_json::json!({
                        "path": file.to_string_lossy(),
                    })),
                    Err(e) => Ok(error_result(e)),
                }
            }
            None => {
                let json = self
                    .app
                    .history()
                    .export(ids)
                    .map_err(|e| McpError::internal_error(e, None))?;
                Ok(CallToolResult::success(vec![Content::text(json)]))
            }
        }
    }

    #[tool(description = "Delete saved content records by ID.")]
    async fn delete_content(
        &self,
        Parameters(params): Parameters<DeleteContentParams>,
    ) -> Result<CallToolResult, McpError> {
        if params.ids.is_empty() {
            return Ok(error_result("Provide at least one record ID to delete"));
        }

        match self.app.history().delete_many(&params.ids) {
            Ok(deleted) => json_result(&serde_json::json!({
                "requested": params.ids.len(),
                "deleted": deleted,
            })),
            Err(e) => Ok(error_result(e)),
        }
    }

    // ========================================================================
    // Preference Tools
    // ========================================================================

    #[tool(description = "Get the saved output language and sign-in state.")]
    async fn get_preferences(
        &self,
        Parameters(_params): Parameters<EmptyParams>,
    ) -> Result<CallToolResult, McpError> {
        let prefs = self.app.preferences();
        let language = prefs
            .language()
            .map_err(|e| McpError::internal_error(e, None))?;
        let is_authenticated = prefs
            .is_authenticated()
            .map_err(|e| McpError::internal_error(e, None))?;
        let user_email = prefs
            .user_email()
            .map_err(|e| McpError::internal_error(e, None))?;

        json_result(&PreferencesResponse {
            language: language.code().to_string(),
            language_name: language.display_name().to_string(),
            is_authenticated,
            user_email,
        })
    }

    #[tool(description = "Set the default output language for generated content (en, hi or ta).")]
    async fn set_language(
        &self,
        Parameters(params): Parameters<SetLanguageParams>,
    ) -> Result<CallToolResult, McpError> {
        let language = match parse_language(&params.language) {
            Ok(language) => language,
            Err(e) => return Ok(error_result(e)),
        };

        self.app
            .preferences()
            .set_language(language)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&serde_json::json!({
            "language": language.code(),
            "languageName": language.display_name(),
        }))
    }
}

impl ServerHandler for KalaConnectMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
                ..Default::default()
            },
            server_info: Implementation {
                name: "kalaconnect-mcp".to_string(),
                title: Some("KalaConnect MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some("KalaConnect MCP Server generates product stories, social captions and heritage context for handmade crafts, and manages the saved content history.".to_string()),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        async move {
            Ok(ListToolsResult {
                tools: self.tool_router.list_all(),
                next_cursor: None,
            })
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            let start_time = Instant::now();
            let tool_name = request.name.clone();
            let category = get_tool_category(&tool_name);

            let tool_context = ToolCallContext::new(self, request, context);
            let result = self.tool_router.call(tool_context).await;
            let duration_ms = start_time.elapsed().as_millis() as u64;

            match &result {
                Ok(call_result) if call_result.is_error.unwrap_or(false) => {
                    tracing::info!(tool = %tool_name, category = category.as_str(), duration_ms, "tool returned error");
                }
                Ok(_) => {
                    tracing::info!(tool = %tool_name, category = category.as_str(), duration_ms, "tool succeeded");
                }
                Err(e) => {
                    tracing::error!(tool = %tool_name, category = category.as_str(), duration_ms, "tool failed: {}", e);
                }
            }

            result
        }
    }
}

/// Print help information about available MCP tools
fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(r#"KalaConnect MCP Server v{}

USAGE:
    kalaconnect-mcp [OPTIONS]

OPTIONS:
    --help, -h      Print this help information
    --version, -v   Print version information
    --list-tools    List all available MCP tools

DESCRIPTION:
    KalaConnect MCP Server lets AI assistants turn a craft photo and a few
    keywords into a product story, a social caption and heritage context,
    in English, Hindi or Tamil.

MCP TOOLS:

  GENERATION
    generate_craft_content  Story, caption and heritage context for a photo
    analyze_craft_image     Describe a craft photo
    generate_text           Text-only generation

  REQUEST STATE
    cancel_request          Cancel the in-flight request
    get_processing_status   Stage label and progress of the current request

  CONTENT HISTORY
    list_content_history    List saved content with filters
    export_content_history  Export saved content as JSON
    delete_content          Delete saved content by ID

  PREFERENCES
    get_preferences         Saved language and sign-in state
    set_language            Set the default output language

ENVIRONMENT:
    GEMINI_API_KEY                    Gemini API key (required for generation)
    KALACONNECT_DATA_DIR              Database directory
    KALACONNECT_GEMINI_ENDPOINT       Gemini API base URL
    KALACONNECT_MULTIMODAL_MODEL      Model for image requests
    KALACONNECT_TEXT_MODEL            Model for text requests
    KALACONNECT_REQUEST_TIMEOUT_SECS  Per-request timeout
    RUST_LOG                          Log filter (logs go to stderr)

EXAMPLES:
    # Start the MCP server (for AI integration)
    kalaconnect-mcp

    # List available tools
    kalaconnect-mcp --list-tools
"#, version);
}

fn print_version() {
    println!("kalaconnect-mcp {}", env!("CARGO_PKG_VERSION"));
}

/// List all tools in a simple format
fn list_tools_simple() {
    println!("KalaConnect MCP Tools:\n");
    let tools = [
        ("generate_craft_content", "Story, caption and heritage context for a photo"),
        ("analyze_craft_image", "Describe a craft photo"),
        ("generate_text", "Text-only generation"),
        ("cancel_request", "Cancel the in-flight request"),
        ("get_processing_status", "Stage label and progress of the current request"),
        ("list_content_history", "List saved content with filters"),
        ("export_content_history", "Export saved content as JSON"),
        ("delete_content", "Delete saved content by ID"),
        ("get_preferences", "Saved language and sign-in state"),
        ("set_language", "Set the default output language"),
    ];

    for (name, desc) in tools {
        println!("  {:<25} {}", name, desc);
    }
    println!();
}

/// Logs go to stderr; stdout carries the MCP transport
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    for arg in &args[1..] {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--version" | "-v" => {
                print_version();
                return Ok(());
            }
            "--list-tools" => {
                list_tools_simple();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown option: {}", arg);
                eprintln!("Use --help for usage information");
                std::process::exit(1);
            }
        }
    }

    init_logging();
    tracing::info!("Starting KalaConnect MCP Server (PID: {})", std::process::id());

    let config = AppConfig::from_env()?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        gemini_configured = config.has_api_key(),
        "Configuration loaded"
    );

    let app = KalaConnect::open(config)?;
    let server = KalaConnectMcp::new(app.clone());

    let service = rmcp::serve_server(server, (stdin(), stdout())).await?;

    #[cfg(unix)]
    {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sighup = signal(SignalKind::hangup())?;

        tokio::select! {
            result = service.waiting() => {
                match result {
                    Ok(_) => tracing::info!("Service ended normally"),
                    Err(e) => tracing::error!("Service ended with error: {:?}", e),
                }
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, shutting down");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, shutting down");
            }
            _ = sighup.recv() => {
                tracing::info!("Received SIGHUP (parent process died), shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        service.waiting().await?;
    }

    // Stop any generation still waiting on the service
    app.cancel_request();
    tracing::info!("Shutdown complete");
    Ok(())
}
