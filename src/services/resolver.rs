use crate::services::exchange::{InboundRequest, OutboundRequest};
use crate::services::logger::Logger;
use crate::spec::{InputParameterSpec, ParameterLocation};
use crate::utils::json_path;
use crate::utils::template::{expand_template, render_value, Context};
use serde_json::Value;

pub fn extract_input_value(
    param: &InputParameterSpec,
    request: &InboundRequest,
    body: Option<&Value>,
) -> Option<Value> {
    if let Some(constant) = &param.constant {
        return Some(constant.clone());
    }
    let name = param.name();
    match param.location() {
        ParameterLocation::Path => request.path_param(name).map(|v| Value::String(v.to_string())),
        ParameterLocation::Query => request.query_value(name).map(|v| Value::String(v.to_string())),
        ParameterLocation::Header => request.headers.get(name).map(|v| Value::String(v.to_string())),
        ParameterLocation::Environment => std::env::var(name).ok().map(Value::String),
        ParameterLocation::Body => {
            let root = body?;
            match param.template().map(str::trim_start) {
                Some(template) if template.starts_with('$') => {
                    json_path::extract(root, template)
                }
                _ => Some(root.clone()),
            }
        }
    }
}

pub fn collect_inbound_parameters(
    params: &[InputParameterSpec],
    request: &InboundRequest,
    body: Option<&Value>,
    context: &mut Context,
) {
    for param in params {
        let name = param.name();
        if name.is_empty() {
            continue;
        }
        if let Some(value) = extract_input_value(param, request, body) {
            if !value.is_null() {
                context.insert(name.to_string(), value);
            }
        }
    }
}

fn outbound_value(param: &InputParameterSpec, context: &Context) -> Option<Value> {
    if let Some(constant) = &param.constant {
        return Some(constant.clone());
    }
    if let Some(template) = param.template() {
        return Some(Value::String(expand_template(template, context)));
    }
    if let Some(value) = context.get(param.name()).filter(|v| !v.is_null()) {
        return Some(value.clone());
    }
    if param.location() == ParameterLocation::Environment {
        return std::env::var(param.name()).ok().map(Value::String);
    }
    None
}

// Returns the values written back to the context so callers can propagate them.
pub fn apply_input_parameters(
    params: &[InputParameterSpec],
    context: &mut Context,
    request: &mut OutboundRequest,
    logger: &Logger,
) -> Context {
    let mut written = Context::new();
    for param in params {
        let name = param.name();
        if name.is_empty() {
            continue;
        }
        let Some(value) = outbound_value(param, context) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let text = render_value(&value);
        context.insert(name.to_string(), value.clone());
        written.insert(name.to_string(), value);

        match param.location() {
            ParameterLocation::Header => {
                if text.contains(['\r', '\n']) {
                    logger.debug(
                        "skipping header parameter with line breaks",
                        Some(&serde_json::json!({ "name": name })),
                    );
                    continue;
                }
                request.headers.set(name, text);
            }
            ParameterLocation::Query => request.append_query(name, &text),
            _ => {}
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(raw: Value) -> InputParameterSpec {
        serde_json::from_value(raw).expect("parameter")
    }

    #[test]
    fn constants_win_over_every_location() {
        let param = input(json!({"name": "id", "in": "path", "const": "fixed"}));
        let inbound = InboundRequest::new("GET", "/").with_path_param("id", "7");
        assert_eq!(
            extract_input_value(&param, &inbound, None),
            Some(json!("fixed"))
        );
    }

    #[test]
    fn headers_are_matched_case_insensitively() {
        let param = input(json!({"name": "x-tenant", "in": "header"}));
        let inbound = InboundRequest::new("GET", "/").with_header("X-Tenant", "acme");
        assert_eq!(
            extract_input_value(&param, &inbound, None),
            Some(json!("acme"))
        );
    }

    #[test]
    fn body_templates_run_path_extraction() {
        let body = json!({"user": {"name": "Ann", "age": 30}});
        let inbound = InboundRequest::new("POST", "/");
        let name = input(json!({"name": "n", "template": "$.user.name"}));
        let age = input(json!({"name": "a", "template": "  $.user.age"}));
        let whole = input(json!({"name": "payload"}));
        assert_eq!(
            extract_input_value(&name, &inbound, Some(&body)),
            Some(json!("Ann"))
        );
        assert_eq!(extract_input_value(&age, &inbound, Some(&body)), Some(json!(30)));
        assert_eq!(extract_input_value(&whole, &inbound, Some(&body)), Some(body.clone()));
        assert_eq!(extract_input_value(&whole, &inbound, None), None);
    }

    #[test]
    fn outbound_injection_sets_headers_and_query() {
        let params = vec![
            input(json!({"name": "X-Api-Version", "in": "header", "const": "2"})),
            input(json!({"name": "search", "in": "query", "template": "{{term}} x"})),
            input(json!({"name": "missing", "in": "query"})),
        ];
        let mut context = json!({"term": "rust"}).as_object().cloned().unwrap_or_default();
        let mut request = OutboundRequest::new("GET", "https://api.test/find");
        let written = apply_input_parameters(
            &params,
            &mut context,
            &mut request,
            &Logger::new("test"),
        );
        assert_eq!(request.headers.get("x-api-version"), Some("2"));
        assert_eq!(request.url, "https://api.test/find?search=rust+x");
        assert_eq!(context.get("search"), Some(&json!("rust x")));
        assert_eq!(written.len(), 2);
    }
}
