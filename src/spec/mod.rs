pub mod consumes;
pub mod exposes;
pub mod loader;
pub mod parameter;

pub use consumes::{
    ApiKeyPlacement, ApiKeySpec, AuthenticationSpec, BearerSpec, ClientOperationRef,
    ClientOperationSpec, ClientResourceSpec, ConsumedBackendSpec, CredentialsSpec, HttpClientSpec,
};
pub use exposes::{
    ApiOperationSpec, ApiResourceSpec, ApiServerSpec, CallSpec, ExposedInterfaceSpec, ForwardSpec,
    McpServerSpec, McpTransportKind, StepSpec, ToolSpec,
};
pub use loader::{load_capability, parse_capability, DocumentFormat};
pub use parameter::{
    InputParameterSpec, InputSource, OutputParameterSpec, OutputSource, ParameterLocation,
    ParameterSpec,
};

use crate::errors::EngineError;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CapabilityDocument {
    #[serde(alias = "naftiko", default)]
    pub version: Option<String>,
    #[serde(default)]
    pub info: Option<InfoSpec>,
    pub capability: CapabilitySpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InfoSpec {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub stakeholders: Vec<StakeholderSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeholderSpec {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CapabilitySpec {
    #[serde(default)]
    pub exposes: Vec<ExposedInterfaceSpec>,
    #[serde(default)]
    pub consumes: Vec<ConsumedBackendSpec>,
}

impl CapabilityDocument {
    pub(crate) fn link(mut self) -> Result<Self, EngineError> {
        self.capability.link()?;
        Ok(self)
    }
}

impl CapabilitySpec {
    // Second construction pass: validates list cardinality and binds client operations to resources.
    pub(crate) fn link(&mut self) -> Result<(), EngineError> {
        if self.exposes.is_empty() {
            return Err(EngineError::config(
                "Capability must expose at least one server adapter",
            ));
        }
        if self.consumes.is_empty() {
            return Err(EngineError::config(
                "Capability must consume at least one backend",
            ));
        }
        for consumed in self.consumes.iter_mut() {
            match consumed {
                ConsumedBackendSpec::Http(client) => client.link(),
            }
        }
        Ok(())
    }

    pub fn client(&self, namespace: &str) -> Option<&HttpClientSpec> {
        self.consumes
            .iter()
            .filter_map(ConsumedBackendSpec::as_http)
            .find(|client| client.namespace == namespace)
    }

    pub fn clients(&self) -> impl Iterator<Item = &HttpClientSpec> {
        self.consumes.iter().filter_map(ConsumedBackendSpec::as_http)
    }

    pub fn operation_references(&self) -> Vec<String> {
        self.clients()
            .flat_map(|client| client.operations().map(|op| op.reference()))
            .collect()
    }

    pub fn api_servers(&self) -> impl Iterator<Item = &ApiServerSpec> {
        self.exposes.iter().filter_map(|exposed| match exposed {
            ExposedInterfaceSpec::Api(server) => Some(server),
            ExposedInterfaceSpec::Mcp(_) => None,
        })
    }

    pub fn mcp_servers(&self) -> impl Iterator<Item = &McpServerSpec> {
        self.exposes.iter().filter_map(|exposed| match exposed {
            ExposedInterfaceSpec::Mcp(server) => Some(server),
            ExposedInterfaceSpec::Api(_) => None,
        })
    }
}
