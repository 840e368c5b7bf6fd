use crate::constants::{mcp as mcp_consts, network};
use crate::errors::{EngineError, ErrorCode, McpError};
use crate::managers::orchestrator::Orchestrator;
use crate::managers::tool_calls::{text_result, ToolCallHandler};
use crate::mcp::catalog::list_tools;
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::rest::router::bind_address;
use crate::services::exchange::GatewayResponse;
use crate::services::logger::Logger;
use crate::spec::{ExposedInterfaceSpec, McpServerSpec};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};
use axum::Router;
use dashmap::DashSet;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

pub struct McpServer {
    tools: ToolCallHandler,
    orchestrator: Arc<Orchestrator>,
    interface_index: usize,
    sessions: DashSet<String>,
    logger: Logger,
}

fn parse_message(text: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let parsed: Value = serde_json::from_str(text).map_err(|err| {
        JsonRpcResponse::failure(
            Value::Null,
            ErrorCode::ParseError.as_i32(),
            format!("Parse error: {}", err),
        )
    })?;
    let id = parsed.get("id").cloned().unwrap_or(Value::Null);
    serde_json::from_value(parsed).map_err(|err| {
        JsonRpcResponse::failure(
            id,
            ErrorCode::InvalidRequest.as_i32(),
            format!("Invalid Request: {}", err),
        )
    })
}

impl McpServer {
    pub fn new(orchestrator: Arc<Orchestrator>, interface_index: usize) -> Result<Self, EngineError> {
        match orchestrator.capability().exposes.get(interface_index) {
            Some(ExposedInterfaceSpec::Mcp(_)) => {}
            _ => {
                return Err(EngineError::internal(format!(
                    "Exposed interface {} is not a tool server",
                    interface_index
                )))
            }
        }
        let logger = orchestrator.logger().child("mcp");
        Ok(Self {
            tools: ToolCallHandler::new(Arc::clone(&orchestrator), interface_index),
            orchestrator,
            interface_index,
            sessions: DashSet::new(),
            logger,
        })
    }

    fn spec(&self) -> Option<&McpServerSpec> {
        match self.orchestrator.capability().exposes.get(self.interface_index) {
            Some(ExposedInterfaceSpec::Mcp(server)) => Some(server),
            _ => None,
        }
    }

    pub fn address(&self) -> String {
        let spec = self.spec();
        bind_address(
            spec.and_then(|s| s.address.as_deref()),
            spec.and_then(|s| s.port),
            network::DEFAULT_MCP_PORT,
        )
    }

    pub fn has_session(&self, id: &str) -> bool {
        self.sessions.contains(id)
    }

    fn handle_initialize(&self) -> Value {
        let mut result = serde_json::json!({
            "protocolVersion": mcp_consts::PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": self.spec().map(|s| s.namespace.as_str()).unwrap_or(""),
                "version": mcp_consts::SERVER_VERSION,
            },
        });
        if let (Some(description), Some(obj)) = (
            self.spec().and_then(|s| s.description.as_deref()),
            result.as_object_mut(),
        ) {
            obj.insert(
                "instructions".to_string(),
                Value::String(description.to_string()),
            );
        }
        result
    }

    fn handle_tools_list(&self) -> Value {
        let tools = self.spec().map(list_tools).unwrap_or_default();
        serde_json::json!({ "tools": tools })
    }

    async fn handle_tools_call(&self, params: Option<&Value>) -> Result<Value, McpError> {
        let Some(params) = params.filter(|p| !p.is_null()) else {
            return Err(McpError::invalid_params("Invalid params: missing params"));
        };
        let name = params.get("name").and_then(Value::as_str).unwrap_or("");
        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()));

        match self.tools.call_tool(name, &arguments).await {
            Ok(result) => Ok(result),
            Err(err) if err.is_client_error() => {
                self.logger.warn(
                    &err.message,
                    Some(&serde_json::json!({ "tool": name })),
                );
                let McpError { code, message } = McpError::from(err);
                Err(McpError::new(code, format!("Invalid params: {}", message)))
            }
            Err(err) => {
                self.logger.error(
                    &err.message,
                    Some(&serde_json::json!({ "tool": name })),
                );
                Ok(text_result(format!("Error: {}", err.message), true))
            }
        }
    }

    /// Dispatches one JSON-RPC message. Notifications produce no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone().unwrap_or(Value::Null);
        if !request.has_valid_version() {
            return Some(JsonRpcResponse::failure(
                id,
                ErrorCode::InvalidRequest.as_i32(),
                "Invalid Request: jsonrpc must be '2.0'".to_string(),
            ));
        }
        if request.method.starts_with("notifications/") {
            return None;
        }

        self.logger.debug(
            "json-rpc request",
            Some(&serde_json::json!({ "method": request.method })),
        );
        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize()),
            "tools/list" => Ok(self.handle_tools_list()),
            "tools/call" => self.handle_tools_call(request.params.as_ref()).await,
            "ping" => Ok(serde_json::json!({})),
            other => Err(McpError::method_not_found(other)),
        };
        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => JsonRpcResponse::from_error(id, err),
        })
    }

    pub async fn handle_text(&self, text: &str) -> Option<JsonRpcResponse> {
        match parse_message(text) {
            Ok(request) => self.handle_request(request).await,
            Err(response) => Some(response),
        }
    }

    pub async fn run_stdio(&self) -> Result<(), EngineError> {
        let stdin = tokio::io::stdin();
        let stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin).lines();
        let mut writer = BufWriter::new(stdout);
        self.logger.info("serving tools over stdio", None);

        while let Some(line) = reader.next_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(response) = self.handle_text(trimmed).await {
                writer.write_all(response.to_line().as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
        Ok(())
    }

    pub fn router(self: Arc<Self>) -> Router {
        Router::new().fallback(handle_http).with_state(self)
    }

    async fn handle_post(&self, body: &[u8]) -> Response {
        let text = String::from_utf8_lossy(body);
        if text.trim().is_empty() {
            let response = JsonRpcResponse::failure(
                Value::Null,
                ErrorCode::ParseError.as_i32(),
                "Parse error: empty body".to_string(),
            );
            return json_rpc_reply(&response, None);
        }
        let request = match parse_message(&text) {
            Ok(request) => request,
            Err(response) => return json_rpc_reply(&response, None),
        };

        let initializing = request.method == "initialize" && request.has_valid_version();
        match self.handle_request(request).await {
            Some(response) => {
                let session = initializing.then(|| {
                    let id = uuid::Uuid::new_v4().to_string();
                    self.sessions.insert(id.clone());
                    id
                });
                json_rpc_reply(&response, session)
            }
            None => GatewayResponse::empty(202).into_response(),
        }
    }

    fn handle_delete(&self, headers: &HeaderMap) -> Response {
        if let Some(id) = headers
            .get(mcp_consts::SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            self.sessions.remove(id);
        }
        GatewayResponse::empty(200).into_response()
    }
}

fn json_rpc_reply(response: &JsonRpcResponse, session: Option<String>) -> Response {
    let value = serde_json::to_value(response).unwrap_or(Value::Null);
    let mut reply = GatewayResponse::json(200, &value);
    if let Some(id) = session {
        reply.headers.set(mcp_consts::SESSION_HEADER, id);
    }
    reply.into_response()
}

async fn handle_http(
    State(server): State<Arc<McpServer>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method == Method::POST {
        server.handle_post(&body).await
    } else if method == Method::DELETE {
        server.handle_delete(&headers)
    } else if method == Method::GET {
        GatewayResponse::text(405, "GET not supported").into_response()
    } else {
        GatewayResponse::text(405, "Method not allowed").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_message_reports_parse_error() {
        let response = parse_message("{not json").unwrap_err();
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"]["code"], -32700);
        assert_eq!(value["id"], Value::Null);
    }

    #[test]
    fn parse_message_reports_invalid_request_with_id() {
        let response = parse_message(r#"{"jsonrpc":"2.0","id":4}"#).unwrap_err();
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"]["code"], -32600);
        assert_eq!(value["id"], 4);
    }
}
