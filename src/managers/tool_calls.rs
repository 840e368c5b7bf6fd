use crate::constants::{mcp as mcp_consts, messages};
use crate::errors::{EngineError, EngineErrorKind};
use crate::managers::orchestrator::{CallOutcome, Orchestrator};
use crate::services::converter::convert;
use crate::services::exchange::OutboundResponse;
use crate::services::logger::Logger;
use crate::services::output_mapping::{build_mock, can_build_mock, map_outputs};
use crate::spec::{
    ClientOperationRef, ExposedInterfaceSpec, McpServerSpec, OutputParameterSpec, ToolSpec,
};
use crate::utils::suggest::did_you_mean;
use crate::utils::template::Context;
use serde_json::Value;
use std::sync::Arc;

pub fn text_result(text: impl Into<String>, is_error: bool) -> Value {
    serde_json::json!({
        "content": [ { "type": "text", "text": text.into() } ],
        "isError": is_error,
    })
}

pub struct ToolCallHandler {
    orchestrator: Arc<Orchestrator>,
    interface_index: usize,
    logger: Logger,
}

impl ToolCallHandler {
    pub fn new(orchestrator: Arc<Orchestrator>, interface_index: usize) -> Self {
        let logger = orchestrator.logger().child("tools");
        Self {
            orchestrator,
            interface_index,
            logger,
        }
    }

    pub fn server(&self) -> Option<&McpServerSpec> {
        match self.orchestrator.capability().exposes.get(self.interface_index) {
            Some(ExposedInterfaceSpec::Mcp(server)) => Some(server),
            _ => None,
        }
    }

    pub fn tools(&self) -> &[ToolSpec] {
        self.server()
            .map(|server| server.tools.as_slice())
            .unwrap_or_default()
    }

    fn unknown_tool(&self, name: &str) -> EngineError {
        let mut err = EngineError::dispatch(format!("Unknown tool: {}", name))
            .with_details(serde_json::json!({ "tool": name }));
        if let Some(hint) = did_you_mean(
            name,
            self.tools().iter().map(|tool| tool.name.as_str()),
            mcp_consts::MAX_SUGGESTIONS,
        ) {
            err = err.with_hint(hint);
        }
        err
    }

    pub async fn call_tool(&self, name: &str, arguments: &Value) -> Result<Value, EngineError> {
        let tool = self
            .server()
            .and_then(|server| server.tool(name))
            .ok_or_else(|| self.unknown_tool(name))?;

        let mut context = Context::new();
        if let Some(args) = arguments.as_object() {
            context.extend(args.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        for (key, value) in tool.with.iter() {
            context.insert(key.clone(), value.clone());
        }

        self.logger.debug(
            "tool call",
            Some(&serde_json::json!({ "tool": name, "arguments": context.len() })),
        );

        match self
            .orchestrator
            .run(tool.call.as_ref(), &tool.steps, &context)
            .await
        {
            Ok(CallOutcome::Completed { target, response }) => {
                Ok(self.tool_result(tool, target, &response))
            }
            Ok(CallOutcome::Unresolved { reference }) => {
                if can_build_mock(&tool.output_parameters) {
                    return Ok(mock_result(&tool.output_parameters));
                }
                Err(self.orchestrator.invalid_call(&reference))
            }
            Ok(CallOutcome::NoCall) => {
                if can_build_mock(&tool.output_parameters) {
                    return Ok(mock_result(&tool.output_parameters));
                }
                Err(EngineError::dispatch(format!(
                    "{}: tool '{}' declares no call",
                    messages::INVALID_CALL,
                    name
                )))
            }
            Err(err) if err.kind == EngineErrorKind::Backend => {
                self.logger.error(&err.message, None);
                Ok(text_result(
                    format!("{}: {}", messages::TOOL_CALL_FAILED, err.message),
                    true,
                ))
            }
            Err(err) if err.is_client_error() => Err(err),
            Err(err) => {
                self.logger.error(&err.message, None);
                Ok(text_result(format!("Error: {}", err.message), true))
            }
        }
    }

    fn tool_result(
        &self,
        tool: &ToolSpec,
        target: ClientOperationRef<'_>,
        response: &OutboundResponse,
    ) -> Value {
        let is_error = response.status >= 400;
        if response.body.is_empty() {
            return text_result(
                format!(
                    "No response entity received (HTTP {} {})",
                    response.status,
                    response.reason()
                ),
                true,
            );
        }

        let outputs = if tool.output_parameters.is_empty() {
            &target.operation.output_parameters
        } else {
            &tool.output_parameters
        };
        if !outputs.is_empty() {
            let format = target.operation.output_raw_format.as_deref();
            let schema = target.operation.output_schema.as_deref();
            match convert(format, schema, &response.body) {
                Ok(root) => {
                    if let Some(mapped) = map_outputs(outputs, &root) {
                        let text = serde_json::to_string(&mapped)
                            .unwrap_or_else(|_| mapped.to_string());
                        return text_result(text, is_error);
                    }
                }
                Err(err) => {
                    let err = EngineError::from(err);
                    self.logger.warn(
                        &format!("{}: {}", messages::MAPPING_FAILED, err.message),
                        None,
                    );
                    return text_result(
                        format!("{}: {}", messages::MAPPING_FAILED, err.message),
                        true,
                    );
                }
            }
        }
        text_result(response.body_text(), is_error)
    }
}

fn mock_result(outputs: &[OutputParameterSpec]) -> Value {
    let mock = Value::Object(build_mock(outputs));
    let text = serde_json::to_string_pretty(&mock).unwrap_or_else(|_| mock.to_string());
    text_result(text, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_result_wraps_single_text_block() {
        let result = text_result("hello", false);
        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["content"][0]["text"], "hello");
        assert_eq!(result["isError"], false);
    }
}
