use crate::spec::OutputParameterSpec;
use crate::utils::json_path;
use crate::utils::text::truncate_chars;
use serde_json::{Map, Value};

fn apply_max_length(value: Value, param: &OutputParameterSpec) -> Value {
    match (value, param.max_length()) {
        (Value::String(text), Some(limit)) => Value::String(truncate_chars(&text, limit)),
        (value, _) => value,
    }
}

fn extract(root: &Value, param: &OutputParameterSpec) -> Option<Value> {
    json_path::extract(root, param.mapping().unwrap_or(""))
}

fn map_element(items: Option<&OutputParameterSpec>, element: &Value) -> Value {
    let Some(items) = items else {
        return element.clone();
    };
    if items.constant.is_some() || !items.properties.is_empty() || items.values.is_some() {
        return map_output(items, element).unwrap_or(Value::Null);
    }
    match items.mapping() {
        Some(mapping) if !mapping.trim().is_empty() => json_path::extract(element, mapping)
            .map(|value| apply_max_length(value, items))
            .unwrap_or(Value::Null),
        _ => element.clone(),
    }
}

fn map_properties(properties: &[OutputParameterSpec], root: &Value) -> Value {
    let mut out = Map::new();
    for property in properties {
        out.insert(
            property.name().to_string(),
            map_output(property, root).unwrap_or(Value::Null),
        );
    }
    Value::Object(out)
}

pub fn map_output(param: &OutputParameterSpec, root: &Value) -> Option<Value> {
    if let Some(constant) = &param.constant {
        return Some(constant.clone());
    }

    if param.is_kind("array") {
        let Value::Array(elements) = extract(root, param)? else {
            return None;
        };
        let items = param.items.as_deref();
        return Some(Value::Array(
            elements.iter().map(|element| map_element(items, element)).collect(),
        ));
    }

    let object_like = param.is_kind("object")
        || (param.kind.is_none() && (param.values.is_some() || !param.properties.is_empty()));
    if object_like {
        if let Some(values) = param.values.as_deref() {
            let source = match param.mapping().filter(|m| !m.trim().is_empty()) {
                Some(_) => extract(root, param)?,
                None => root.clone(),
            };
            let Value::Object(members) = source else {
                return None;
            };
            let mut out = Map::new();
            for (key, member) in members {
                let mapped = match values.mapping().filter(|m| !m.trim().is_empty()) {
                    Some(mapping) => json_path::extract(&member, mapping),
                    None => Some(member),
                };
                out.insert(
                    key,
                    mapped
                        .map(|value| apply_max_length(value, values))
                        .unwrap_or(Value::Null),
                );
            }
            return Some(Value::Object(out));
        }
        if !param.properties.is_empty() {
            return Some(map_properties(&param.properties, root));
        }
    }

    extract(root, param).map(|value| apply_max_length(value, param))
}

// The first body-located parameter that maps to something becomes the response.
pub fn map_outputs(params: &[OutputParameterSpec], root: &Value) -> Option<Value> {
    params
        .iter()
        .filter(|param| param.source.reads_body())
        .find_map(|param| map_output(param, root))
}

pub fn can_build_mock(params: &[OutputParameterSpec]) -> bool {
    params.iter().any(OutputParameterSpec::carries_constant)
}

fn mock_object(properties: &[OutputParameterSpec]) -> Map<String, Value> {
    let mut out = Map::new();
    for property in properties {
        if property.name().is_empty() {
            if let Some(Value::Object(inner)) = mock_value(property) {
                out.extend(inner);
            }
            continue;
        }
        if let Some(value) = mock_value(property) {
            out.insert(property.name().to_string(), value);
        }
    }
    out
}

fn mock_value(param: &OutputParameterSpec) -> Option<Value> {
    if let Some(constant) = &param.constant {
        return Some(constant.clone());
    }
    if param.is_kind("array") {
        let element = mock_value(param.items.as_deref()?)?;
        return Some(Value::Array(vec![element]));
    }
    if param.is_kind("object") || !param.properties.is_empty() {
        let object = mock_object(&param.properties);
        return (!object.is_empty()).then_some(Value::Object(object));
    }
    None
}

pub fn build_mock(params: &[OutputParameterSpec]) -> Map<String, Value> {
    mock_object(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn output(raw: Value) -> OutputParameterSpec {
        serde_json::from_value(raw).expect("output parameter")
    }

    #[test]
    fn constants_beat_mappings() {
        let param = output(json!({
            "type": "array", "const": "fixed", "mapping": "$.rows",
            "items": {"mapping": "$.id"}
        }));
        assert_eq!(map_output(&param, &json!({"rows": [1]})), Some(json!("fixed")));
    }

    #[test]
    fn array_items_with_values_keep_each_element() {
        let param = output(json!({
            "type": "array", "mapping": "$.rates",
            "items": {"type": "object", "values": {"type": "number"}}
        }));
        let root = json!({"rates": [{"eur": 1.0}, {"usd": 1.1, "gbp": 0.8}]});
        assert_eq!(
            map_output(&param, &root),
            Some(json!([{"eur": 1.0}, {"usd": 1.1, "gbp": 0.8}]))
        );
    }

    #[test]
    fn max_length_truncates_only_long_strings() {
        let param = output(json!({"mapping": "$.v", "maxLength": "3"}));
        assert_eq!(map_output(&param, &json!({"v": "abcdef"})), Some(json!("abc")));
        assert_eq!(map_output(&param, &json!({"v": "abc"})), Some(json!("abc")));
        assert_eq!(map_output(&param, &json!({"v": 123456})), Some(json!(123456)));
        let lenient = output(json!({"mapping": "$.v", "maxLength": "lots"}));
        assert_eq!(map_output(&lenient, &json!({"v": "abcdef"})), Some(json!("abcdef")));
    }

    #[test]
    fn array_items_with_properties_map_each_element_in_order() {
        let param = output(json!({
            "type": "array",
            "mapping": "$.users",
            "items": {
                "type": "object",
                "properties": [
                    {"name": "id", "mapping": "$.uid"},
                    {"name": "label", "mapping": "$.profile.display"}
                ]
            }
        }));
        let root = json!({"users": [
            {"uid": 1, "profile": {"display": "Ann"}},
            {"uid": 2, "profile": {"display": "Bob"}}
        ]});
        assert_eq!(
            map_output(&param, &root),
            Some(json!([{"id": 1, "label": "Ann"}, {"id": 2, "label": "Bob"}]))
        );
    }

    #[test]
    fn array_over_non_array_is_null() {
        let param = output(json!({"type": "array", "mapping": "$.users"}));
        assert_eq!(map_output(&param, &json!({"users": {"a": 1}})), None);
        assert_eq!(map_output(&param, &json!({})), None);
    }

    #[test]
    fn values_map_preserves_member_names() {
        let param = output(json!({
            "type": "object",
            "mapping": "$.rates",
            "values": {"mapping": "$.value"}
        }));
        let root = json!({"rates": {
            "usd": {"value": 1.0},
            "eur": {"value": 0.9},
            "gbp": {"value": 0.8}
        }});
        assert_eq!(
            map_output(&param, &root),
            Some(json!({"usd": 1.0, "eur": 0.9, "gbp": 0.8}))
        );
    }

    #[test]
    fn object_properties_read_from_outer_tree() {
        let param = output(json!({
            "type": "object",
            "properties": [{"name": "name", "mapping": "$.name"}, {"name": "gone", "mapping": "$.nope"}]
        }));
        assert_eq!(
            map_output(&param, &json!({"id": "7", "name": "Ann"})),
            Some(json!({"name": "Ann", "gone": null}))
        );
    }

    #[test]
    fn mock_uses_constants_recursively() {
        let params = vec![
            output(json!({"name": "status", "const": "ok"})),
            output(json!({"name": "tags", "type": "array", "items": {"const": "new"}})),
            output(json!({"name": "meta", "type": "object",
                "properties": [{"name": "v", "const": 1}]})),
            output(json!({"name": "ignored", "mapping": "$.x"})),
        ];
        assert!(can_build_mock(&params));
        assert_eq!(
            Value::Object(build_mock(&params)),
            json!({"status": "ok", "tags": ["new"], "meta": {"v": 1}})
        );
    }

    #[test]
    fn mapping_only_outputs_cannot_mock() {
        let params = vec![output(json!({"name": "x", "mapping": "$.x"}))];
        assert!(!can_build_mock(&params));
        assert!(build_mock(&params).is_empty());
    }
}
