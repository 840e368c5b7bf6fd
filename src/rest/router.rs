use crate::constants::{http as http_consts, network};
use crate::errors::EngineError;
use crate::managers::api_operations::ApiOperationsHandler;
use crate::managers::orchestrator::Orchestrator;
use crate::services::exchange::{GatewayResponse, InboundRequest};
use crate::spec::{ApiServerSpec, ExposedInterfaceSpec};
use axum::body::Body;
use axum::extract::{Path, Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Translates `/users/{{id}}` into axum's `/users/:id`. A trailing
/// `{{path}}` segment captures the rest of the URI as `*path`.
pub fn axum_path(template: &str) -> Result<String, EngineError> {
    let trimmed = template.trim();
    if trimmed.is_empty() || trimmed == "/" {
        return Ok("/".to_string());
    }
    let segments: Vec<&str> = trimmed.trim_start_matches('/').split('/').collect();
    let last = segments.len().saturating_sub(1);
    let mut out = String::new();
    for (index, segment) in segments.iter().enumerate() {
        out.push('/');
        if !segment.contains("{{") && !segment.contains("}}") {
            out.push_str(segment);
            continue;
        }
        let name = segment
            .strip_prefix("{{")
            .and_then(|rest| rest.strip_suffix("}}"))
            .map(str::trim)
            .filter(|name| !name.is_empty() && !name.contains(['{', '}']))
            .ok_or_else(|| {
                EngineError::config(format!(
                    "Unsupported path template segment '{}' in '{}'",
                    segment, template
                ))
                .with_hint("Placeholders must span a whole path segment, e.g. /users/{{id}}")
            })?;
        if index == last && name == http_consts::FORWARD_PATH_VARIABLE {
            out.push('*');
        } else {
            out.push(':');
        }
        out.push_str(name);
    }
    Ok(out)
}

// Routes that differ only in capture names collide inside axum.
fn route_shape(route: &str) -> String {
    route
        .split('/')
        .map(|segment| match segment.chars().next() {
            Some(':') => ":",
            Some('*') => "*",
            _ => segment,
        })
        .collect::<Vec<_>>()
        .join("/")
}

struct RouteState {
    handler: ApiOperationsHandler,
}

pub fn build_router(
    orchestrator: &Arc<Orchestrator>,
    interface_index: usize,
) -> Result<Router, EngineError> {
    let Some(ExposedInterfaceSpec::Api(server)) =
        orchestrator.capability().exposes.get(interface_index)
    else {
        return Err(EngineError::internal(format!(
            "Exposed interface {} is not a REST server",
            interface_index
        )));
    };

    let mut router = Router::new();
    let mut seen = HashSet::new();
    for (resource_index, resource) in server.resources.iter().enumerate() {
        let route = axum_path(&resource.path)?;
        if !seen.insert(route_shape(&route)) {
            return Err(EngineError::config(format!(
                "Duplicate resource path '{}' in server '{}'",
                resource.path,
                server.namespace.as_deref().unwrap_or("api")
            )));
        }
        let state = Arc::new(RouteState {
            handler: ApiOperationsHandler::new(
                Arc::clone(orchestrator),
                interface_index,
                resource_index,
            ),
        });
        router = router.route(&route, any(handle_request).with_state(state));
    }
    Ok(router)
}

async fn handle_request(
    State(state): State<Arc<RouteState>>,
    params: Option<Path<HashMap<String, String>>>,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, http_consts::MAX_INBOUND_BODY_BYTES).await {
        Ok(body) => body,
        Err(err) => {
            return GatewayResponse::text(413, format!("Unable to read request body: {}", err))
                .into_response()
        }
    };

    let mut inbound = InboundRequest::new(parts.method.as_str(), parts.uri.path());
    if let Some(Path(params)) = params {
        inbound.path_params = params;
    }
    if let Some(query) = parts.uri.query() {
        inbound.query = parse_query(query);
    }
    for (name, value) in parts.headers.iter() {
        if let Ok(value) = value.to_str() {
            inbound.headers.append(name.as_str(), value);
        }
    }
    inbound.body = body;

    state.handler.handle(inbound).await.into_response()
}

// Pairs that do not decode cleanly are dropped one by one.
fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| serde_urlencoded::from_str::<Vec<(String, String)>>(pair).ok())
        .flatten()
        .filter(|(name, value)| !name.contains('\u{FFFD}') && !value.contains('\u{FFFD}'))
        .collect()
}

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;
        let headers = response.headers_mut();
        for (name, value) in self.headers.iter() {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.append(name, value);
            }
        }
        response
    }
}

pub fn bind_address(address: Option<&str>, port: Option<u16>, default_port: u16) -> String {
    let host = address
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .unwrap_or(network::DEFAULT_ADDRESS);
    format!("{}:{}", host, port.unwrap_or(default_port))
}

pub async fn serve(router: Router, addr: &str) -> Result<(), EngineError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| EngineError::config(format!("Unable to bind {}: {}", addr, err)))?;
    axum::serve(listener, router)
        .await
        .map_err(|err| EngineError::internal(format!("Server on {} stopped: {}", addr, err)))
}

pub fn server_address(server: &ApiServerSpec) -> String {
    bind_address(
        server.address.as_deref(),
        server.port,
        network::DEFAULT_API_PORT,
    )
}
