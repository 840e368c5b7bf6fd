use crate::errors::EngineError;
use crate::utils::data_path::lookup_in_map;
use serde_json::{Map, Value};

pub type Context = Map<String, Value>;

pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Number(num) => num.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

fn resolve_expression(expression: &str, context: &Context) -> String {
    let key = expression.trim();
    if key.is_empty() {
        return String::new();
    }
    lookup_in_map(context, key)
        .map(render_value)
        .unwrap_or_default()
}

pub fn expand_template(template: &str, context: &Context) -> String {
    if context.is_empty() {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let (prefix, tail) = rest.split_at(start);
        out.push_str(prefix);
        match tail.find("}}") {
            Some(end) => {
                out.push_str(&resolve_expression(&tail[2..end], context));
                rest = &tail[end + 2..];
            }
            None => {
                out.push_str(tail);
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn has_unresolved_placeholder(text: &str) -> bool {
    match text.find("{{") {
        Some(start) => text[start..].contains("}}"),
        None => false,
    }
}

pub fn expand_template_strict(
    template: &str,
    context: &Context,
    label: &str,
) -> Result<String, EngineError> {
    let expanded = expand_template(template, context);
    if has_unresolved_placeholder(&expanded) {
        return Err(EngineError::template(format!(
            "Unresolved template parameters in {}: {}",
            label, expanded
        ))
        .with_details(serde_json::json!({ "template": template })));
    }
    Ok(expanded)
}
