pub mod errors;
pub mod protocol;
pub mod server;
pub mod tools;
/// Model Context Protocol (MCP) server
///
/// JSON-RPC 2.0 messages arrive over a transport, requests are answered by
/// the [`MCPServer`], and `tools/call` is routed to the registered tools.
pub mod transport;

// Re-export core types for easier access
pub use self::{
    server::{MCPServer, MCPServerConfig},
    tools::MCPTool,
    transport::{MCPTransport, StdioTransport},
};

/// MCP Protocol version implemented by this server
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Server information
pub const SERVER_NAME: &str = "filegen";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
