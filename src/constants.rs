pub mod network {
    pub const DEFAULT_ADDRESS: &str = "localhost";
    pub const DEFAULT_API_PORT: u16 = 8080;
    pub const DEFAULT_MCP_PORT: u16 = 3000;
    pub const TIMEOUT_API_REQUEST_MS: u64 = 30_000;
    pub const TIMEOUT_CONNECTION_MS: u64 = 5_000;
    pub const MAX_REDIRECTS: usize = 10;
}

pub mod http {
    pub const USER_AGENT: &str = concat!("capgate/", env!("CARGO_PKG_VERSION"));
    pub const DEFAULT_ACCEPT: &str = "application/json, text/plain, */*";
    pub const JSON_CONTENT_TYPE: &str = "application/json";
    pub const LOG_PREVIEW_BYTES: usize = 512;
    pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
    pub const MAX_INBOUND_BODY_BYTES: usize = 16 * 1024 * 1024;
    pub const FORWARD_PATH_VARIABLE: &str = "path";
}

pub mod mcp {
    pub const PROTOCOL_VERSION: &str = "2025-03-26";
    pub const SERVER_VERSION: &str = "1.0.0";
    pub const SESSION_HEADER: &str = "Mcp-Session-Id";
    pub const JSONRPC_VERSION: &str = "2.0";
    pub const MAX_SUGGESTIONS: usize = 3;
}

pub mod messages {
    pub const UNHANDLED_REQUEST: &str =
        "Unable to handle the request. Please check the capability specification.";
    pub const RESOLVE_FAILED: &str = "Error resolving request parameters";
    pub const CLIENT_CALL_FAILED: &str = "Error while handling an HTTP client call";
    pub const MAPPING_FAILED: &str = "Failed to map output parameters";
    pub const INVALID_CALL: &str = "Invalid call format";
    pub const TOOL_CALL_FAILED: &str = "Error during HTTP client call";
}

pub mod env {
    pub const CAPABILITY_PATH: &str = "CAPGATE_CAPABILITY";
    pub const SCHEMA_DIR: &str = "CAPGATE_SCHEMA_DIR";
    pub const HTTP_TIMEOUT_MS: &str = "CAPGATE_HTTP_TIMEOUT_MS";
    pub const LOG_LEVEL: &str = "CAPGATE_LOG_LEVEL";
    pub const LOG_LEVEL_FALLBACK: &str = "LOG_LEVEL";
    pub const LOG_FORMAT: &str = "CAPGATE_LOG_FORMAT";
    pub const DEFAULT_CAPABILITY_FILE: &str = "capability.yaml";
}
