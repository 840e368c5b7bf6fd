use crate::spec::{InputParameterSpec, McpServerSpec, ToolSpec};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

fn parameter_schema(param: &InputParameterSpec) -> Value {
    let mut schema = Map::new();
    schema.insert(
        "type".to_string(),
        Value::String(param.kind_or_default().to_string()),
    );
    if let Some(description) = &param.description {
        schema.insert(
            "description".to_string(),
            Value::String(description.clone()),
        );
    }
    if !param.allowed.is_empty() {
        schema.insert("enum".to_string(), Value::Array(param.allowed.clone()));
    }
    if let Some(items) = &param.items {
        schema.insert("items".to_string(), parameter_schema(items));
    }
    if !param.properties.is_empty() {
        schema.insert(
            "properties".to_string(),
            Value::Object(properties_schema(&param.properties)),
        );
    }
    Value::Object(schema)
}

fn properties_schema(params: &[InputParameterSpec]) -> Map<String, Value> {
    params
        .iter()
        .filter(|param| !param.name().is_empty())
        .map(|param| (param.name().to_string(), parameter_schema(param)))
        .collect()
}

pub fn input_schema(params: &[InputParameterSpec]) -> Value {
    let properties = properties_schema(params);
    let required: Vec<Value> = properties
        .keys()
        .map(|name| Value::String(name.clone()))
        .collect();
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

pub fn tool_def(tool: &ToolSpec) -> ToolDef {
    ToolDef {
        name: tool.name.clone(),
        description: tool.description.clone().unwrap_or_default(),
        input_schema: input_schema(&tool.input_parameters),
    }
}

pub fn list_tools(server: &McpServerSpec) -> Vec<ToolDef> {
    server.tools.iter().map(tool_def).collect()
}
