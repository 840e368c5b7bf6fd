mod engine_error;
mod mcp_error;

pub use engine_error::{EngineError, EngineErrorKind};
pub use mcp_error::{ErrorCode, McpError};
