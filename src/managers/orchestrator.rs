use crate::constants::{http as http_consts, mcp as mcp_consts, messages};
use crate::errors::EngineError;
use crate::services::auth::apply_authentication;
use crate::services::exchange::{OutboundRequest, OutboundResponse};
use crate::services::http_client::HttpTransport;
use crate::services::logger::Logger;
use crate::services::resolver::apply_input_parameters;
use crate::spec::{
    CallSpec, CapabilitySpec, ClientOperationRef, HttpClientSpec, ParameterLocation, StepSpec,
};
use crate::utils::redact::redact_url;
use crate::utils::suggest::did_you_mean;
use crate::utils::template::{expand_template_strict, render_value, Context};
use serde_json::{Map, Value};
use std::sync::Arc;

pub enum CallOutcome<'a> {
    Completed {
        target: ClientOperationRef<'a>,
        response: OutboundResponse,
    },
    Unresolved {
        reference: String,
    },
    NoCall,
}

pub struct PreparedCall {
    pub request: OutboundRequest,
    pub written: Context,
}

pub struct Orchestrator {
    capability: Arc<CapabilitySpec>,
    transport: Arc<dyn HttpTransport>,
    logger: Logger,
}

fn layered(base: &Context, layers: &[&Map<String, Value>]) -> Context {
    let mut merged = base.clone();
    for layer in layers {
        for (key, value) in layer.iter() {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

impl Orchestrator {
    pub fn new(
        capability: Arc<CapabilitySpec>,
        transport: Arc<dyn HttpTransport>,
        logger: Logger,
    ) -> Self {
        Self {
            capability,
            transport,
            logger,
        }
    }

    pub fn capability(&self) -> &CapabilitySpec {
        &self.capability
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    // `namespace.operationName`, exactly two tokens.
    pub fn find_target(&self, reference: &str) -> Option<ClientOperationRef<'_>> {
        let mut tokens = reference.trim().split('.');
        let (Some(namespace), Some(name), None) = (tokens.next(), tokens.next(), tokens.next())
        else {
            return None;
        };
        self.capability.client(namespace)?.operation(name)
    }

    pub fn invalid_call(&self, reference: &str) -> EngineError {
        let mut err = EngineError::dispatch(format!("{}: {}", messages::INVALID_CALL, reference));
        let known = self.capability.operation_references();
        if let Some(hint) = did_you_mean(
            reference,
            known.iter().map(String::as_str),
            mcp_consts::MAX_SUGGESTIONS,
        ) {
            err = err.with_hint(hint);
        }
        err
    }

    pub fn finish_request(
        &self,
        client: &HttpClientSpec,
        context: &Context,
        request: &mut OutboundRequest,
    ) {
        if let Some(auth) = &client.authentication {
            apply_authentication(auth, context, request);
        }
        for param in &client.input_parameters {
            if param.location() != ParameterLocation::Header {
                continue;
            }
            if let Some(constant) = &param.constant {
                request.headers.set(param.name(), render_value(constant));
            }
        }
        request.headers.set_default("User-Agent", http_consts::USER_AGENT);
        request.headers.set_default("Accept", http_consts::DEFAULT_ACCEPT);
    }

    pub fn prepare_call(
        &self,
        target: ClientOperationRef<'_>,
        context: &mut Context,
    ) -> Result<PreparedCall, EngineError> {
        let raw_url = format!("{}{}", target.client.base_uri, target.resource.path);
        let url = expand_template_strict(&raw_url, context, "request URL")?;
        let mut request = OutboundRequest::new(&target.operation.method, url);

        let mut written = apply_input_parameters(
            &target.client.input_parameters,
            context,
            &mut request,
            &self.logger,
        );
        written.extend(apply_input_parameters(
            &target.operation.input_parameters,
            context,
            &mut request,
            &self.logger,
        ));

        if let Some(body) = target.operation.body_template() {
            let body = expand_template_strict(&body, context, "request body")?;
            request
                .headers
                .set("Content-Type", http_consts::JSON_CONTENT_TYPE);
            request.body = Some(body.into());
        }

        self.finish_request(target.client, context, &mut request);
        Ok(PreparedCall { request, written })
    }

    pub async fn send(
        &self,
        reference: &str,
        request: OutboundRequest,
    ) -> Result<OutboundResponse, EngineError> {
        self.logger.debug(
            "calling backend operation",
            Some(&serde_json::json!({
                "operation": reference,
                "method": request.method,
                "url": redact_url(&request.url, &request.secret_keys),
            })),
        );
        let response = self.transport.send(request).await?;
        self.logger.debug(
            "backend responded",
            Some(&serde_json::json!({ "operation": reference, "status": response.status })),
        );
        Ok(response)
    }

    pub async fn run<'a>(
        &'a self,
        call: Option<&CallSpec>,
        steps: &[StepSpec],
        context: &Context,
    ) -> Result<CallOutcome<'a>, EngineError> {
        if !steps.is_empty() {
            return self.run_steps(steps, context).await;
        }
        let Some(call) = call else {
            return Ok(CallOutcome::NoCall);
        };
        let mut merged = layered(context, &[&call.with]);
        let Some(target) = self.find_target(&call.operation) else {
            return Ok(CallOutcome::Unresolved {
                reference: call.operation.clone(),
            });
        };
        let prepared = self.prepare_call(target, &mut merged)?;
        let response = self.send(&call.operation, prepared.request).await?;
        Ok(CallOutcome::Completed { target, response })
    }

    // Steps see the running context plus their own `with`; the operation's call is ignored.
    async fn run_steps<'a>(
        &'a self,
        steps: &[StepSpec],
        context: &Context,
    ) -> Result<CallOutcome<'a>, EngineError> {
        let mut running = context.clone();
        let mut last = None;
        for (index, step) in steps.iter().enumerate() {
            let mut merged = layered(&running, &[&step.with, &step.call.with]);
            let target = self.find_target(&step.call.operation).ok_or_else(|| {
                let err = self.invalid_call(&step.call.operation);
                EngineError {
                    message: format!("{} (step {})", err.message, index + 1),
                    ..err
                }
            })?;
            let prepared = self.prepare_call(target, &mut merged)?;
            running.extend(prepared.written);
            let response = self.send(&step.call.operation, prepared.request).await?;
            last = Some((target, response));
        }
        match last {
            Some((target, response)) => Ok(CallOutcome::Completed { target, response }),
            None => Ok(CallOutcome::NoCall),
        }
    }
}
