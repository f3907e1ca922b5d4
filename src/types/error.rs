//! Error types for the IQPilot server

use std::path::PathBuf;

use thiserror::Error;

/// JSON-RPC error codes
///
/// Standard JSON-RPC codes plus the server-specific range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Standard JSON-RPC errors (-32xxx)
    /// Parse error: Invalid JSON
    ParseError = -32700,
    /// Invalid request: Not a valid request object
    InvalidRequest = -32600,
    /// Method not found
    MethodNotFound = -32601,
    /// Invalid params
    InvalidParams = -32602,
    /// Internal error
    InternalError = -32603,

    // IQPilot errors (-32000 to -32099)
    /// Article file does not exist
    ArticleNotFound = -32001,
    /// Metadata block present but malformed
    MetadataParse = -32002,
    /// Tool name not registered
    ToolNotFound = -32003,
    /// Underlying read/write failure
    Io = -32004,
    /// Template lookup or rendering failed
    Template = -32005,
    /// Configuration error
    ConfigError = -32010,
}

impl ErrorCode {
    /// Get the error code value
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Main error type for the server
#[derive(Debug, Error)]
pub enum IqPilotError {
    // === Article / metadata errors ===
    /// Target article does not exist
    #[error("Article not found: {}", .0.display())]
    ArticleNotFound(PathBuf),

    /// Metadata block is present but not a well-formed mapping
    #[error("Invalid metadata YAML in {}: {message}", path.display())]
    MetadataParse { path: PathBuf, message: String },

    // === Protocol errors ===
    /// Tool name not registered
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Two handlers declared the same tool name
    #[error("Duplicate tool registration: {0}")]
    DuplicateTool(String),

    /// A handler was asked to run a tool it does not own
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Malformed tool arguments or request params
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    // === Collaborator errors ===
    /// Template not found or not renderable
    #[error("Template error: {0}")]
    Template(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Watcher setup failed
    #[error("Watch error: {0}")]
    Watch(String),

    // === External errors ===
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Generic errors ===
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for the server
pub type Result<T> = std::result::Result<T, IqPilotError>;

impl IqPilotError {
    /// Get the JSON-RPC error code for this error
    pub fn error_code(&self) -> ErrorCode {
        match self {
            IqPilotError::ArticleNotFound(_) => ErrorCode::ArticleNotFound,
            IqPilotError::MetadataParse { .. } => ErrorCode::MetadataParse,
            IqPilotError::ToolNotFound(_) => ErrorCode::ToolNotFound,
            IqPilotError::DuplicateTool(_) => ErrorCode::InternalError,
            IqPilotError::UnknownTool(_) => ErrorCode::MethodNotFound,
            IqPilotError::InvalidParams(_) => ErrorCode::InvalidParams,
            IqPilotError::Template(_) => ErrorCode::Template,
            IqPilotError::Config(_) => ErrorCode::ConfigError,
            IqPilotError::Watch(_) => ErrorCode::InternalError,
            IqPilotError::Io(_) => ErrorCode::Io,
            IqPilotError::Json(_) => ErrorCode::ParseError,
            IqPilotError::Yaml(_) => ErrorCode::MetadataParse,
            IqPilotError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Check if this error is a client error (caused by invalid input)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IqPilotError::ArticleNotFound(_)
                | IqPilotError::ToolNotFound(_)
                | IqPilotError::UnknownTool(_)
                | IqPilotError::InvalidParams(_)
                | IqPilotError::Template(_)
        )
    }

    // === Constructor helpers ===

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        IqPilotError::Internal(msg.into())
    }

    /// Create an article not found error
    pub fn article_not_found(path: impl Into<PathBuf>) -> Self {
        IqPilotError::ArticleNotFound(path.into())
    }

    /// Create a metadata parse error
    pub fn metadata_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        IqPilotError::MetadataParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid params error
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        IqPilotError::InvalidParams(msg.into())
    }

    /// Create a template error
    pub fn template(msg: impl Into<String>) -> Self {
        IqPilotError::Template(msg.into())
    }

    /// Create a configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        IqPilotError::Config(msg.into())
    }
}
