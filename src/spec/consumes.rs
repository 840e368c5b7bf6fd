use crate::spec::parameter::{InputParameterSpec, OutputParameterSpec};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConsumedBackendSpec {
    Http(HttpClientSpec),
}

impl ConsumedBackendSpec {
    pub fn as_http(&self) -> Option<&HttpClientSpec> {
        match self {
            ConsumedBackendSpec::Http(client) => Some(client),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpClientSpec {
    pub namespace: String,
    pub base_uri: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_parameters: Vec<InputParameterSpec>,
    #[serde(default)]
    pub authentication: Option<AuthenticationSpec>,
    #[serde(default)]
    pub resources: Vec<ClientResourceSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResourceSpec {
    #[serde(default)]
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
    pub operations: Vec<ClientOperationSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOperationSpec {
    #[serde(default = "default_method")]
    pub method: String,
    pub name: String,
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
    pub body: Option<Value>,
    #[serde(skip)]
    pub(crate) resource_index: usize,
}

pub(crate) fn default_method() -> String {
    "GET".to_string()
}

impl ClientOperationSpec {
    pub fn resource<'a>(&self, client: &'a HttpClientSpec) -> Option<&'a ClientResourceSpec> {
        client.resources.get(self.resource_index)
    }

    pub fn body_template(&self) -> Option<String> {
        match self.body.as_ref()? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ClientOperationRef<'a> {
    pub client: &'a HttpClientSpec,
    pub resource: &'a ClientResourceSpec,
    pub operation: &'a ClientOperationSpec,
}

impl<'a> ClientOperationRef<'a> {
    pub fn reference(&self) -> String {
        format!("{}.{}", self.client.namespace, self.operation.name)
    }
}

impl HttpClientSpec {
    pub(crate) fn link(&mut self) {
        for (index, resource) in self.resources.iter_mut().enumerate() {
            for operation in resource.operations.iter_mut() {
                operation.resource_index = index;
            }
        }
    }

    pub fn operations(&self) -> impl Iterator<Item = ClientOperationRef<'_>> {
        self.resources.iter().flat_map(move |resource| {
            resource.operations.iter().map(move |operation| ClientOperationRef {
                client: self,
                resource,
                operation,
            })
        })
    }

    pub fn operation(&self, name: &str) -> Option<ClientOperationRef<'_>> {
        let operation = self
            .resources
            .iter()
            .flat_map(|resource| resource.operations.iter())
            .find(|operation| operation.name == name)?;
        Some(ClientOperationRef {
            client: self,
            resource: operation.resource(self)?,
            operation,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthenticationSpec {
    Basic(CredentialsSpec),
    Digest(CredentialsSpec),
    Bearer(BearerSpec),
    #[serde(alias = "apiKey", alias = "api_key")]
    ApiKey(ApiKeySpec),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsSpec {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BearerSpec {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiKeySpec {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub placement: ApiKeyPlacement,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyPlacement {
    #[default]
    Header,
    Query,
}
