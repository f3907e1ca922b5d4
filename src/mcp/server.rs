//! MCP server implementation
//!
//! Terminates the JSON-RPC protocol: handshake, tool discovery and tool
//! calls. Execution is delegated to the [`ToolRegistry`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::protocol::{
    InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    PROTOCOL_VERSION, ServerCapabilities, ServerInfo, ToolCallParams, ToolCallResult,
    ToolsCapability, ToolsListResult,
};
use super::registry::ToolRegistry;
use crate::tracing::ErrorTraceExt;

/// Name announced in `serverInfo`
pub const SERVER_NAME: &str = "iqpilot";

/// MCP server dispatching protocol messages to the tool registry
#[derive(Debug)]
pub struct McpServer {
    /// Tool registry
    registry: Arc<ToolRegistry>,
    /// Server name
    name: String,
    /// Server version
    version: String,
    /// Set by the first `initialize`
    initialized: AtomicBool,
}

impl McpServer {
    /// Create a new MCP server over a registry
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self::with_info(registry, SERVER_NAME, env!("CARGO_PKG_VERSION"))
    }

    /// Create a new MCP server with custom name and version
    pub fn with_info(
        registry: Arc<ToolRegistry>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            name: name.into(),
            version: version.into(),
            initialized: AtomicBool::new(false),
        }
    }

    /// Get the server name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the server version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether a handshake has happened
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Get the tool registry
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle the `initialize` handshake
    ///
    /// Idempotent: repeating it returns the same result.
    #[tracing::instrument(
        name = "mcp_initialize",
        skip(self, params),
        fields(protocol_version = ?params.protocol_version)
    )]
    pub fn initialize(&self, params: InitializeParams) -> InitializeResult {
        let client = params.client_info.unwrap_or_default();
        tracing::info!(
            client_name = client.name.as_deref().unwrap_or("unknown"),
            client_version = client.version.as_deref().unwrap_or("unknown"),
            server_version = %self.version,
            "Handling initialize request"
        );

        self.initialized.store(true, Ordering::Release);

        InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            server_info: ServerInfo {
                name: self.name.clone(),
                version: self.version.clone(),
            },
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
        }
    }

    /// Handle `tools/list`
    pub fn list_tools(&self) -> ToolsListResult {
        tracing::debug!(tools = self.registry.len(), "Listing tools");
        ToolsListResult {
            tools: self.registry.tools().to_vec(),
        }
    }

    /// Handle `tools/call`
    ///
    /// Tool failures are reported in the result, never as protocol errors.
    #[tracing::instrument(name = "mcp_call_tool", skip(self, params), fields(tool = %params.name))]
    pub async fn call_tool(&self, params: ToolCallParams) -> ToolCallResult {
        let start = std::time::Instant::now();
        let arguments = params.arguments.unwrap_or_default();

        match self.registry.execute_tool(&params.name, arguments).await {
            Ok(text) => {
                tracing::info!(
                    tool = %params.name,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Tool call completed"
                );
                ToolCallResult::success(text)
            }
            Err(e) => {
                e.trace_error();
                ToolCallResult::error(&e)
            }
        }
    }

    /// Handle one raw frame and produce the response frame, if any
    pub async fn handle_message(&self, frame: &str) -> Option<String> {
        let response = match serde_json::from_str::<Value>(frame) {
            Ok(value) => self.handle_value(value).await?,
            Err(e) => {
                tracing::warn!(error = %e, "Unparsable frame");
                JsonRpcResponse::failure(Value::Null, JsonRpcError::parse_error(e))
            }
        };

        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response");
                None
            }
        }
    }

    async fn handle_value(&self, value: Value) -> Option<JsonRpcResponse> {
        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::failure(id, JsonRpcError::invalid_request(e)));
            }
        };

        let Some(id) = request.id.clone() else {
            self.handle_notification(&request);
            return None;
        };

        let response = match self.dispatch(request).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        };
        Some(response)
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => tracing::info!("Client finished initialization"),
            "notifications/cancelled" => tracing::debug!("Client cancelled a request"),
            other => tracing::debug!(method = %other, "Ignoring notification"),
        }
    }

    async fn dispatch(&self, request: JsonRpcRequest) -> Result<Value, JsonRpcError> {
        tracing::debug!(method = %request.method, "Dispatching request");
        match request.method.as_str() {
            "initialize" => {
                let params: InitializeParams = parse_params(request.params, true)?;
                to_value(self.initialize(params))
            }
            "tools/list" => to_value(self.list_tools()),
            "tools/call" => {
                let params: ToolCallParams = parse_params(request.params, false)?;
                to_value(self.call_tool(params).await)
            }
            "ping" => Ok(Value::Object(serde_json::Map::new())),
            method => {
                tracing::warn!(method = %method, "Unknown method");
                Err(JsonRpcError::method_not_found(method))
            }
        }
    }
}

fn parse_params<T: DeserializeOwned + Default>(
    params: Option<Value>,
    optional: bool,
) -> Result<T, JsonRpcError> {
    match params {
        Some(Value::Null) | None if optional => Ok(T::default()),
        None => Err(JsonRpcError::invalid_params("missing params")),
        Some(value) => serde_json::from_value(value).map_err(JsonRpcError::invalid_params),
    }
}

fn to_value<T: serde::Serialize>(result: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(result).map_err(JsonRpcError::internal)
}
