use crate::constants::{http as http_consts, messages};
use crate::managers::api_operations::error_response;
use crate::managers::orchestrator::Orchestrator;
use crate::services::exchange::{GatewayResponse, InboundRequest, OutboundRequest};
use crate::services::resolver::apply_input_parameters;
use crate::spec::ForwardSpec;
use crate::utils::template::Context;

pub fn forward_target_url(base_uri: &str, inbound: &InboundRequest) -> String {
    let remaining = inbound
        .path_param(http_consts::FORWARD_PATH_VARIABLE)
        .unwrap_or("");
    let mut url = format!("{}{}", base_uri, remaining);
    if let Some(query) = inbound.query_string() {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&query);
    }
    url
}

pub fn build_forward_request(
    orchestrator: &Orchestrator,
    forward: &ForwardSpec,
    inbound: &InboundRequest,
) -> Option<OutboundRequest> {
    let client = orchestrator.capability().client(&forward.target_namespace)?;
    let url = forward_target_url(&client.base_uri, inbound);
    let mut request = OutboundRequest::new(&inbound.method, url);
    for (name, value) in inbound.headers.iter() {
        if forward.trusts(name) {
            request.headers.append(name, value);
        }
    }
    if !inbound.body.is_empty() {
        request.body = Some(inbound.body.clone());
    }
    let mut context = Context::new();
    apply_input_parameters(
        &client.input_parameters,
        &mut context,
        &mut request,
        orchestrator.logger(),
    );
    orchestrator.finish_request(client, &context, &mut request);
    Some(request)
}

pub async fn forward_request(
    orchestrator: &Orchestrator,
    forward: &ForwardSpec,
    inbound: &InboundRequest,
) -> GatewayResponse {
    let Some(request) = build_forward_request(orchestrator, forward, inbound) else {
        orchestrator.logger().warn(
            "forward target namespace is not consumed",
            Some(&serde_json::json!({ "namespace": forward.target_namespace })),
        );
        return GatewayResponse::text(404, messages::UNHANDLED_REQUEST);
    };
    match orchestrator.send(&forward.target_namespace, request).await {
        Ok(response) => GatewayResponse::passthrough(&response),
        Err(err) => {
            orchestrator.logger().error(&err.message, None);
            error_response(&err)
        }
    }
}
