use crate::spec::consumes::default_method;
use crate::spec::parameter::{InputParameterSpec, OutputParameterSpec};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExposedInterfaceSpec {
    Api(ApiServerSpec),
    Mcp(McpServerSpec),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiServerSpec {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_parameters: Vec<InputParameterSpec>,
    #[serde(default)]
    pub resources: Vec<ApiResourceSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResourceSpec {
    pub path: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_parameters: Vec<InputParameterSpec>,
    #[serde(default)]
    pub operations: Vec<ApiOperationSpec>,
    #[serde(default)]
    pub forward: Option<ForwardSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardSpec {
    pub target_namespace: String,
    #[serde(default)]
    pub trusted_headers: Vec<String>,
}

impl ForwardSpec {
    pub fn trusts(&self, header: &str) -> bool {
        self.trusted_headers
            .iter()
            .any(|trusted| trusted.trim().eq_ignore_ascii_case(header))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOperationSpec {
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_parameters: Vec<InputParameterSpec>,
    #[serde(default)]
    pub output_raw_format: Option<String>,
    #[serde(default)]
    pub output_schema: Option<String>,
    #[serde(default)]
    pub output_parameters: Vec<OutputParameterSpec>,
    #[serde(default)]
    pub call: Option<CallSpec>,
    #[serde(default)]
    pub steps: Vec<StepSpec>,
    #[serde(default)]
    pub with: Map<String, Value>,
}

impl ApiOperationSpec {
    pub fn matches_method(&self, method: &str) -> bool {
        self.method.trim().eq_ignore_ascii_case(method.trim())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallSpec {
    pub operation: String,
    #[serde(default)]
    pub with: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepSpec {
    pub call: CallSpec,
    #[serde(default)]
    pub with: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McpTransportKind {
    #[default]
    Http,
    Stdio,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpServerSpec {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    pub namespace: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub transport: McpTransportKind,
    #[serde(default)]
    pub input_parameters: Vec<InputParameterSpec>,
    #[serde(default)]
    pub tools: Vec<ToolSpec>,
}

impl McpServerSpec {
    pub fn tool(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.iter().find(|tool| tool.name == name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_parameters: Vec<InputParameterSpec>,
    #[serde(default)]
    pub call: Option<CallSpec>,
    #[serde(default)]
    pub with: Map<String, Value>,
    #[serde(default)]
    pub steps: Vec<StepSpec>,
    #[serde(default)]
    pub output_parameters: Vec<OutputParameterSpec>,
}

