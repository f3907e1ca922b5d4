//! MCP (Model Context Protocol) tool server
//!
//! Terminates newline-delimited JSON-RPC over a byte stream and exposes the
//! article tools to a remote agent.
//!
//! ## Tool Categories
//!
//! - **Metadata**: `iqpilot/metadata/*` - read and edit article metadata blocks
//! - **Validation**: `iqpilot/validate/*` - content quality checks
//! - **Content**: `iqpilot/content/*` - templates, gap analysis, related articles
//! - **Workflow**: `iqpilot/workflow/*` - multi-step authoring guides
//! - **Events**: `iqpilot/events/report` - editor-reported file changes

pub mod protocol;
mod registry;
mod server;
pub mod tools;
mod transport;

pub use protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION, ToolCallParams,
    ToolCallResult, ToolDefinition,
};
pub use registry::ToolRegistry;
pub use server::{McpServer, SERVER_NAME};
pub use tools::{ToolArguments, ToolContext, ToolHandler};
pub use transport::{MAX_FRAME_LENGTH, serve};
