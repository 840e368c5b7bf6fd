use crate::constants::messages;
use crate::errors::{EngineError, EngineErrorKind};
use crate::managers::forward::forward_request;
use crate::managers::orchestrator::{CallOutcome, Orchestrator};
use crate::services::converter::convert;
use crate::services::exchange::{GatewayResponse, InboundRequest, OutboundResponse};
use crate::services::logger::Logger;
use crate::services::output_mapping::{build_mock, can_build_mock, map_outputs};
use crate::services::resolver::collect_inbound_parameters;
use crate::spec::{
    ApiOperationSpec, ApiResourceSpec, ApiServerSpec, ClientOperationRef, ExposedInterfaceSpec,
    OutputParameterSpec,
};
use crate::utils::template::Context;
use serde_json::Value;
use std::sync::Arc;

pub struct ApiOperationsHandler {
    orchestrator: Arc<Orchestrator>,
    interface_index: usize,
    resource_index: usize,
    logger: Logger,
}

pub fn error_response(err: &EngineError) -> GatewayResponse {
    let message = match err.kind {
        EngineErrorKind::Template => format!("{}: {}", messages::RESOLVE_FAILED, err.message),
        EngineErrorKind::Backend => format!("{}: {}", messages::CLIENT_CALL_FAILED, err.message),
        EngineErrorKind::Conversion => format!("{}: {}", messages::MAPPING_FAILED, err.message),
        _ => err.message.clone(),
    };
    let mut body = serde_json::json!({ "error": message, "code": err.code });
    if let (Some(hint), Some(obj)) = (&err.hint, body.as_object_mut()) {
        obj.insert("hint".to_string(), Value::String(hint.clone()));
    }
    GatewayResponse::json(err.status(), &body)
}

pub fn mock_response(outputs: &[OutputParameterSpec]) -> GatewayResponse {
    let mock = build_mock(outputs);
    if mock.is_empty() {
        GatewayResponse::empty(204)
    } else {
        GatewayResponse::pretty_json(200, &Value::Object(mock))
    }
}

impl ApiOperationsHandler {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        interface_index: usize,
        resource_index: usize,
    ) -> Self {
        let logger = orchestrator.logger().child("api");
        Self {
            orchestrator,
            interface_index,
            resource_index,
            logger,
        }
    }

    fn server(&self) -> Option<&ApiServerSpec> {
        match self.orchestrator.capability().exposes.get(self.interface_index) {
            Some(ExposedInterfaceSpec::Api(server)) => Some(server),
            _ => None,
        }
    }

    pub fn resource(&self) -> Option<&ApiResourceSpec> {
        self.server()?.resources.get(self.resource_index)
    }

    pub async fn handle(&self, inbound: InboundRequest) -> GatewayResponse {
        let (Some(server), Some(resource)) = (self.server(), self.resource()) else {
            return GatewayResponse::text(500, "Resource is no longer registered");
        };
        self.logger.debug(
            "inbound call",
            Some(&serde_json::json!({
                "method": inbound.method,
                "path": inbound.path,
                "resource": resource.path,
            })),
        );

        if let Some(operation) = resource
            .operations
            .iter()
            .find(|operation| operation.matches_method(&inbound.method))
        {
            if let Some(response) = self
                .handle_operation(server, resource, operation, &inbound)
                .await
            {
                return response;
            }
        }

        if let Some(forward) = &resource.forward {
            return forward_request(&self.orchestrator, forward, &inbound).await;
        }
        GatewayResponse::text(404, messages::UNHANDLED_REQUEST)
    }

    pub fn build_context(
        &self,
        server: &ApiServerSpec,
        resource: &ApiResourceSpec,
        operation: &ApiOperationSpec,
        inbound: &InboundRequest,
    ) -> Context {
        let body = inbound.json_body();
        let mut context = Context::new();
        for params in [
            &server.input_parameters,
            &resource.input_parameters,
            &operation.input_parameters,
        ] {
            collect_inbound_parameters(params, inbound, body.as_ref(), &mut context);
        }
        for (key, value) in operation.with.iter() {
            context.insert(key.clone(), value.clone());
        }
        context
    }

    async fn handle_operation(
        &self,
        server: &ApiServerSpec,
        resource: &ApiResourceSpec,
        operation: &ApiOperationSpec,
        inbound: &InboundRequest,
    ) -> Option<GatewayResponse> {
        let context = self.build_context(server, resource, operation, inbound);
        let outcome = self
            .orchestrator
            .run(operation.call.as_ref(), &operation.steps, &context)
            .await;
        match outcome {
            Ok(CallOutcome::Completed { target, response }) => {
                Some(self.respond(operation, target, response))
            }
            Ok(CallOutcome::Unresolved { reference }) => {
                if can_build_mock(&operation.output_parameters) {
                    return Some(mock_response(&operation.output_parameters));
                }
                let err = self.orchestrator.invalid_call(&reference);
                self.logger.warn(&err.message, None);
                Some(error_response(&err))
            }
            Ok(CallOutcome::NoCall) => can_build_mock(&operation.output_parameters)
                .then(|| mock_response(&operation.output_parameters)),
            Err(err) => {
                let meta = serde_json::json!({ "code": err.code, "status": err.status() });
                if err.is_client_error() {
                    self.logger.warn(&err.message, Some(&meta));
                } else {
                    self.logger.error(&err.message, Some(&meta));
                }
                Some(error_response(&err))
            }
        }
    }

    fn respond(
        &self,
        operation: &ApiOperationSpec,
        target: ClientOperationRef<'_>,
        response: OutboundResponse,
    ) -> GatewayResponse {
        let (outputs, format, schema) = if operation.output_parameters.is_empty() {
            (
                &target.operation.output_parameters,
                target.operation.output_raw_format.as_deref(),
                target.operation.output_schema.as_deref(),
            )
        } else if operation.output_raw_format.is_some() {
            (
                &operation.output_parameters,
                operation.output_raw_format.as_deref(),
                operation.output_schema.as_deref(),
            )
        } else {
            (
                &operation.output_parameters,
                target.operation.output_raw_format.as_deref(),
                target.operation.output_schema.as_deref(),
            )
        };

        if outputs.is_empty() {
            return GatewayResponse::passthrough(&response);
        }

        let root = match convert(format, schema, &response.body) {
            Ok(root) => root,
            Err(err) => {
                let err = EngineError::from(err);
                self.logger.error(
                    &format!("{}: {}", messages::MAPPING_FAILED, err.message),
                    None,
                );
                return error_response(&err);
            }
        };
        match map_outputs(outputs, &root) {
            Some(mapped) => GatewayResponse::json(response.status, &mapped),
            None => GatewayResponse::passthrough(&response),
        }
    }
}
