//! MCP Server implementation using rmcp

use crate::error::Error;
use crate::pdf::{
    extract_fields, shape, DocumentParser, OutputFormat, ParseInvoker, PdfiumParser,
    DEFAULT_PARSE_TIMEOUT,
};
use crate::source::{resolve_path, FileValidator, DEFAULT_MAX_FILE_BYTES};
use anyhow::Result;
use rmcp::{
    handler::server::tool::ToolRouter, handler::server::wrapper::Parameters, model::*,
    schemars::JsonSchema, tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable overriding the maximum file size, in MiB
pub const MAX_FILE_MB_ENV: &str = "PDF_MCP_MAX_FILE_MB";
/// Environment variable overriding the parse timeout, in seconds
pub const PARSE_TIMEOUT_SECS_ENV: &str = "PDF_MCP_PARSE_TIMEOUT_SECS";

/// Resource limits for the PDF Reader MCP Server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Largest file accepted for parsing (default: 50MB)
    pub max_file_bytes: u64,
    /// Time allowed for a single parse (default: 30s)
    pub parse_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            parse_timeout: DEFAULT_PARSE_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Build a config from the process environment, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(mb) = parse_positive(MAX_FILE_MB_ENV, lookup(MAX_FILE_MB_ENV)) {
            config.max_file_bytes = mb * 1024 * 1024;
        }
        if let Some(secs) = parse_positive(PARSE_TIMEOUT_SECS_ENV, lookup(PARSE_TIMEOUT_SECS_ENV))
        {
            config.parse_timeout = Duration::from_secs(secs);
        }

        config
    }
}

fn parse_positive(key: &str, value: Option<String>) -> Option<u64> {
    let raw = value?;
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            tracing::warn!(key, value = %raw, "ignoring invalid configuration value");
            None
        }
    }
}

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExtractTextParams {
    /// Path to the PDF file
    pub path: String,
    /// Output format: "text" (default), "json", or "detailed"
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExtractFormFieldsParams {
    /// Path to the PDF file
    pub path: String,
}

/// A tool invocation with typed arguments
#[derive(Debug, Clone)]
pub enum ToolCall {
    ExtractText(ExtractTextParams),
    ExtractFormFields(ExtractFormFieldsParams),
}

impl ToolCall {
    /// Resolve a tool name and its raw JSON arguments
    pub fn parse(name: &str, args: serde_json::Value) -> crate::error::Result<Self> {
        let invalid = |e: serde_json::Error| Error::InvalidArguments {
            reason: e.to_string(),
        };

        match name {
            "extract_text" => serde_json::from_value(args)
                .map(ToolCall::ExtractText)
                .map_err(invalid),
            "extract_form_fields" => serde_json::from_value(args)
                .map(ToolCall::ExtractFormFields)
                .map_err(invalid),
            _ => Err(Error::UnknownOperation {
                name: name.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::ExtractText(_) => "extract_text",
            ToolCall::ExtractFormFields(_) => "extract_form_fields",
        }
    }
}

// ============================================================================
// Response envelope
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

/// Uniform result of every tool call: one text item, flagged on failure
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub content: Vec<TextContent>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResponse {
    pub fn success(text: String) -> Self {
        Self {
            content: vec![TextContent {
                content_type: "text".to_string(),
                text,
            }],
            is_error: false,
        }
    }

    pub fn error(err: &Error) -> Self {
        Self {
            content: vec![TextContent {
                content_type: "text".to_string(),
                text: format!("Error: {}", err),
            }],
            is_error: true,
        }
    }

    /// Text of the single content item
    pub fn text(&self) -> &str {
        self.content
            .first()
            .map(|c| c.text.as_str())
            .unwrap_or_default()
    }
}

impl From<ToolResponse> for CallToolResult {
    fn from(response: ToolResponse) -> Self {
        let contents = response
            .content
            .into_iter()
            .map(|c| Content::text(c.text))
            .collect();

        if response.is_error {
            CallToolResult::error(contents)
        } else {
            CallToolResult::success(contents)
        }
    }
}

// ============================================================================
// Server
// ============================================================================

/// PDF Reader MCP Server
#[derive(Clone)]
pub struct PdfServer {
    validator: FileValidator,
    invoker: ParseInvoker,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl PdfServer {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Create a new PdfServer backed by PDFium
    pub fn with_config(config: ServerConfig) -> Self {
        Self::with_parser(config, Arc::new(PdfiumParser))
    }

    /// Create a new PdfServer with a custom parsing engine
    pub fn with_parser(config: ServerConfig, parser: Arc<dyn DocumentParser>) -> Self {
        Self {
            validator: FileValidator::new(config.max_file_bytes),
            invoker: ParseInvoker::with_timeout(parser, config.parse_timeout),
            tool_router: Self::tool_router(),
        }
    }

    /// Extract text content from a PDF file
    #[tool(
        description = "Extract text content and metadata from a PDF file.

Formats:
- text (default): plain text, pages separated by newlines
- json: {pages, text, metadata}
- detailed: the full parsed document structure (pages, text items, fields)"
    )]
    async fn extract_text(
        &self,
        Parameters(params): Parameters<ExtractTextParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.execute(ToolCall::ExtractText(params)).await.into())
    }

    /// Extract form fields from a PDF file
    #[tool(
        description = "Extract form fields from a PDF file. Returns a list of {name, type, value, options} in document order."
    )]
    async fn extract_form_fields(
        &self,
        Parameters(params): Parameters<ExtractFormFieldsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.execute(ToolCall::ExtractFormFields(params)).await.into())
    }
}

impl PdfServer {
    /// Route a named tool call. Never fails: every error becomes an error
    /// envelope.
    pub async fn dispatch(&self, name: &str, args: serde_json::Value) -> ToolResponse {
        match ToolCall::parse(name, args) {
            Ok(call) => self.execute(call).await,
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool call rejected");
                ToolResponse::error(&e)
            }
        }
    }

    /// Run a typed tool call through validation, parsing and shaping
    pub async fn execute(&self, call: ToolCall) -> ToolResponse {
        let tool = call.name();
        let result = match &call {
            ToolCall::ExtractText(params) => self.process_extract_text(params).await,
            ToolCall::ExtractFormFields(params) => self.process_extract_form_fields(params).await,
        };

        match result {
            Ok(text) => ToolResponse::success(text),
            Err(e) => {
                if e.is_validation() {
                    tracing::info!(tool, error = %e, "input rejected");
                } else {
                    tracing::warn!(tool, error = %e, "tool call failed");
                }
                ToolResponse::error(&e)
            }
        }
    }

    /// Validate a caller-supplied path and resolve it to absolute form
    fn prepare_path(&self, path: &str) -> crate::error::Result<PathBuf> {
        self.validator.validate(path)?;
        Ok(resolve_path(path)?)
    }

    async fn process_extract_text(
        &self,
        params: &ExtractTextParams,
    ) -> crate::error::Result<String> {
        let path = self.prepare_path(&params.path)?;
        let document = self.invoker.parse(&path).await?;

        let format = params
            .format
            .as_deref()
            .map(OutputFormat::from_name)
            .unwrap_or_default();

        shape(document, format)?.into_text()
    }

    async fn process_extract_form_fields(
        &self,
        params: &ExtractFormFieldsParams,
    ) -> crate::error::Result<String> {
        let path = self.prepare_path(&params.path)?;
        let document = self.invoker.parse(&path).await?;

        let fields = extract_fields(&document);
        Ok(serde_json::to_string_pretty(&fields)?)
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "PDF Reader MCP Server extracts text, metadata, and form fields from local PDF files. \
                 Files must be .pdf, at most 50MB, and outside system directories."
                    .into(),
            ),
        }
    }
}

/// Run the MCP server with default configuration
pub async fn run_server() -> Result<()> {
    run_server_with_config(ServerConfig::default()).await
}

/// Run the MCP server with full configuration
pub async fn run_server_with_config(config: ServerConfig) -> Result<()> {
    tracing::info!(
        max_file_bytes = config.max_file_bytes,
        parse_timeout_secs = config.parse_timeout.as_secs(),
        "PDF Reader MCP Server ready, waiting for connections..."
    );

    let server = PdfServer::with_config(config);
    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{FormField, Page, ParsedDocument, TextItem, TextRun};
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct StubParser {
        document: ParsedDocument,
        calls: AtomicUsize,
    }

    impl StubParser {
        fn new(document: ParsedDocument) -> Arc<Self> {
            Arc::new(Self {
                document,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl DocumentParser for StubParser {
        fn parse(&self, _path: &Path) -> crate::error::Result<ParsedDocument> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.document.clone())
        }
    }

    fn sample_document() -> ParsedDocument {
        ParsedDocument {
            meta: None,
            pages: vec![Page {
                texts: vec![TextItem {
                    x: 0.0,
                    y: 0.0,
                    runs: vec![TextRun::from_plain("Hello World")],
                }],
                fields: vec![FormField {
                    id: Some("email".to_string()),
                    field_type: Some("text".to_string()),
                    ..FormField::default()
                }],
                ..Page::default()
            }],
        }
    }

    fn write_pdf(dir: &TempDir, name: &str) -> String {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"%PDF-1.7\n%stub\n").unwrap();
        path.to_string_lossy().to_string()
    }

    fn server_with(parser: Arc<StubParser>) -> PdfServer {
        PdfServer::with_parser(ServerConfig::default(), parser)
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.max_file_bytes, 50 * 1024 * 1024);
        assert_eq!(config.parse_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_server_config_from_lookup() {
        let config = ServerConfig::from_lookup(|key| match key {
            MAX_FILE_MB_ENV => Some("10".to_string()),
            PARSE_TIMEOUT_SECS_ENV => Some("5".to_string()),
            _ => None,
        });
        assert_eq!(config.max_file_bytes, 10 * 1024 * 1024);
        assert_eq!(config.parse_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_server_config_ignores_invalid_values() {
        let config = ServerConfig::from_lookup(|key| match key {
            MAX_FILE_MB_ENV => Some("lots".to_string()),
            PARSE_TIMEOUT_SECS_ENV => Some("0".to_string()),
            _ => None,
        });
        assert_eq!(config.max_file_bytes, DEFAULT_MAX_FILE_BYTES);
        assert_eq!(config.parse_timeout, DEFAULT_PARSE_TIMEOUT);
    }

    #[test]
    fn test_tool_call_parse() {
        let call = ToolCall::parse(
            "extract_text",
            serde_json::json!({"path": "a.pdf", "format": "json"}),
        )
        .unwrap();
        assert_eq!(call.name(), "extract_text");

        let call =
            ToolCall::parse("extract_form_fields", serde_json::json!({"path": "a.pdf"})).unwrap();
        assert_eq!(call.name(), "extract_form_fields");
    }

    #[test]
    fn test_tool_call_parse_missing_path() {
        let result = ToolCall::parse("extract_text", serde_json::json!({}));
        assert!(matches!(result, Err(Error::InvalidArguments { .. })));
    }

    #[test]
    fn test_envelope_serialization() {
        let ok = serde_json::to_value(ToolResponse::success("hi".to_string())).unwrap();
        assert_eq!(
            ok,
            serde_json::json!({"content": [{"type": "text", "text": "hi"}]})
        );

        let err = serde_json::to_value(ToolResponse::error(&Error::MissingSignature)).unwrap();
        assert_eq!(
            err,
            serde_json::json!({
                "content": [{"type": "text", "text": "Error: Invalid PDF file: missing %PDF signature"}],
                "isError": true
            })
        );
    }

    #[test]
    fn test_envelope_into_call_tool_result() {
        let result: CallToolResult = ToolResponse::error(&Error::MissingSignature).into();
        assert_eq!(result.is_error, Some(true));

        let result: CallToolResult = ToolResponse::success("ok".to_string()).into();
        assert_eq!(result.is_error, Some(false));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let server = server_with(StubParser::new(sample_document()));

        let response = server.dispatch("bogus", serde_json::json!({})).await;
        assert!(response.is_error);
        assert_eq!(response.content.len(), 1);
        assert!(response.text().contains("Unknown tool: bogus"));
    }

    #[tokio::test]
    async fn test_dispatch_extract_text_default_format() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(&dir, "doc.pdf");
        let server = server_with(StubParser::new(sample_document()));

        let response = server
            .dispatch("extract_text", serde_json::json!({ "path": path }))
            .await;
        assert!(!response.is_error);
        assert_eq!(response.text(), "Hello World");
    }

    #[tokio::test]
    async fn test_dispatch_extract_text_json_format() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(&dir, "doc.pdf");
        let server = server_with(StubParser::new(sample_document()));

        let response = server
            .dispatch(
                "extract_text",
                serde_json::json!({ "path": path, "format": "json" }),
            )
            .await;
        assert!(!response.is_error);

        let body: serde_json::Value = serde_json::from_str(response.text()).unwrap();
        assert_eq!(body["pages"], 1);
        assert_eq!(body["text"], "Hello World");
        assert_eq!(body["metadata"]["author"], "");
    }

    #[tokio::test]
    async fn test_dispatch_unknown_format_falls_back_to_text() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(&dir, "doc.pdf");
        let server = server_with(StubParser::new(sample_document()));

        let response = server
            .dispatch(
                "extract_text",
                serde_json::json!({ "path": path, "format": "xml" }),
            )
            .await;
        assert!(!response.is_error);
        assert_eq!(response.text(), "Hello World");
    }

    #[tokio::test]
    async fn test_dispatch_extract_form_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(&dir, "form.pdf");
        let server = server_with(StubParser::new(sample_document()));

        let response = server
            .dispatch("extract_form_fields", serde_json::json!({ "path": path }))
            .await;
        assert!(!response.is_error);

        let body: serde_json::Value = serde_json::from_str(response.text()).unwrap();
        assert_eq!(
            body,
            serde_json::json!([{"name": "email", "type": "text", "value": "", "options": []}])
        );
    }

    #[tokio::test]
    async fn test_validation_failure_skips_parser() {
        let dir = TempDir::new().unwrap();
        let parser = StubParser::new(sample_document());
        let server = server_with(Arc::clone(&parser));

        let missing = dir.path().join("missing.pdf").to_string_lossy().to_string();
        let response = server
            .dispatch("extract_text", serde_json::json!({ "path": missing }))
            .await;

        assert!(response.is_error);
        assert!(response.text().starts_with("Error: File not found"));
        assert_eq!(parser.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let parser = StubParser::new(sample_document());
        let server = server_with(Arc::clone(&parser));

        let response = server
            .dispatch(
                "extract_form_fields",
                serde_json::json!({ "path": "../../etc/passwd.pdf" }),
            )
            .await;

        assert!(response.is_error);
        assert!(response.text().contains("unsafe file path"));
        assert_eq!(parser.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_invalid_arguments() {
        let server = server_with(StubParser::new(sample_document()));

        let response = server
            .dispatch("extract_text", serde_json::json!({ "path": 42 }))
            .await;
        assert!(response.is_error);
        assert!(response.text().starts_with("Error: Invalid arguments"));
    }

    #[test]
    fn test_get_info_enables_tools() {
        let server = server_with(StubParser::new(ParsedDocument::default()));
        let info = server.get_info();
        assert!(info.capabilities.tools.is_some());
    }
}
