use crate::errors::EngineError;
use crate::managers::orchestrator::Orchestrator;
use crate::mcp::server::McpServer;
use crate::rest::router::{build_router, serve, server_address};
use crate::services::http_client::{HttpTransport, ReqwestTransport};
use crate::services::logger::Logger;
use crate::spec::{CapabilityDocument, ExposedInterfaceSpec, InfoSpec, McpTransportKind};
use axum::Router;
use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use serde_json::Value;
use std::sync::Arc;

pub enum Adapter {
    Api { address: String, router: Router },
    McpHttp { address: String, server: Arc<McpServer> },
    McpStdio { server: Arc<McpServer> },
}

pub struct App {
    pub logger: Logger,
    pub version: Option<String>,
    pub info: InfoSpec,
    pub orchestrator: Arc<Orchestrator>,
    pub adapters: Vec<Adapter>,
}

impl App {
    pub fn initialize(document: CapabilityDocument, logger: Logger) -> Result<Self, EngineError> {
        let transport = ReqwestTransport::from_env(logger.child("http"))?;
        Self::with_transport(document, Arc::new(transport), logger)
    }

    pub fn with_transport(
        document: CapabilityDocument,
        transport: Arc<dyn HttpTransport>,
        logger: Logger,
    ) -> Result<Self, EngineError> {
        let CapabilityDocument {
            version,
            info,
            capability,
        } = document;
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(capability),
            transport,
            logger.child("engine"),
        ));

        let mut adapters = Vec::new();
        let mut stdio_servers = 0usize;
        for (index, exposed) in orchestrator.capability().exposes.iter().enumerate() {
            match exposed {
                ExposedInterfaceSpec::Api(server) => adapters.push(Adapter::Api {
                    address: server_address(server),
                    router: build_router(&orchestrator, index)?,
                }),
                ExposedInterfaceSpec::Mcp(server) => {
                    let mcp = Arc::new(McpServer::new(Arc::clone(&orchestrator), index)?);
                    match server.transport {
                        McpTransportKind::Http => adapters.push(Adapter::McpHttp {
                            address: mcp.address(),
                            server: mcp,
                        }),
                        McpTransportKind::Stdio => {
                            stdio_servers += 1;
                            adapters.push(Adapter::McpStdio { server: mcp });
                        }
                    }
                }
            }
        }
        if stdio_servers > 1 {
            return Err(EngineError::config(
                "At most one tool server may use the stdio transport",
            ));
        }

        Ok(Self {
            logger,
            version,
            info: info.unwrap_or_default(),
            orchestrator,
            adapters,
        })
    }

    pub fn summary(&self) -> Value {
        let capability = self.orchestrator.capability();
        let exposes: Vec<Value> = capability
            .exposes
            .iter()
            .map(|exposed| match exposed {
                ExposedInterfaceSpec::Api(server) => serde_json::json!({
                    "type": "api",
                    "namespace": server.namespace,
                    "address": server_address(server),
                    "resources": server
                        .resources
                        .iter()
                        .map(|resource| resource.path.clone())
                        .collect::<Vec<_>>(),
                }),
                ExposedInterfaceSpec::Mcp(server) => serde_json::json!({
                    "type": "mcp",
                    "namespace": server.namespace,
                    "transport": match server.transport {
                        McpTransportKind::Http => "http",
                        McpTransportKind::Stdio => "stdio",
                    },
                    "tools": server
                        .tools
                        .iter()
                        .map(|tool| tool.name.clone())
                        .collect::<Vec<_>>(),
                }),
            })
            .collect();
        let consumes: Vec<Value> = capability
            .clients()
            .map(|client| {
                serde_json::json!({
                    "type": "http",
                    "namespace": client.namespace,
                    "baseUri": client.base_uri,
                    "operations": client
                        .operations()
                        .map(|op| op.reference())
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        serde_json::json!({
            "version": self.version,
            "label": self.info.label,
            "exposes": exposes,
            "consumes": consumes,
        })
    }

    /// Serves every adapter until one of them fails.
    pub async fn run(self) -> Result<(), EngineError> {
        let logger = self.logger.clone();
        let tasks: Vec<BoxFuture<'static, Result<(), EngineError>>> = self
            .adapters
            .into_iter()
            .map(|adapter| match adapter {
                Adapter::Api { address, router } => {
                    let meta = serde_json::json!({ "address": address });
                    logger.info("REST server listening", Some(&meta));
                    async move { serve(router, &address).await }.boxed()
                }
                Adapter::McpHttp { address, server } => {
                    let meta = serde_json::json!({ "address": address });
                    logger.info("tool server listening", Some(&meta));
                    async move { serve(server.router(), &address).await }.boxed()
                }
                Adapter::McpStdio { server } => async move { server.run_stdio().await }.boxed(),
            })
            .collect();
        try_join_all(tasks).await.map(|_| ())
    }
}
