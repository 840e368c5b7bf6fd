use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Environment,
    #[default]
    Body,
}

impl ParameterLocation {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "path" => ParameterLocation::Path,
            "query" => ParameterLocation::Query,
            "header" => ParameterLocation::Header,
            "environment" | "env" => ParameterLocation::Environment,
            _ => ParameterLocation::Body,
        }
    }
}

impl<'de> Deserialize<'de> for ParameterLocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(ParameterLocation::parse).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputSource {
    #[serde(rename = "in", default)]
    pub location: ParameterLocation,
    #[serde(default)]
    pub template: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputSource {
    #[serde(rename = "in", default)]
    pub location: Option<String>,
    #[serde(default)]
    pub mapping: Option<String>,
}

impl OutputSource {
    pub fn reads_body(&self) -> bool {
        self.location
            .as_deref()
            .map(|loc| loc.trim().eq_ignore_ascii_case("body"))
            .unwrap_or(true)
    }
}

// One recursive node shape for both directions; `S` carries the direction-specific selector.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "S: DeserializeOwned"))]
pub struct ParameterSpec<S> {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "const", default)]
    pub constant: Option<Value>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(rename = "enum", default)]
    pub allowed: Vec<Value>,
    #[serde(default)]
    pub max_length: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_items")]
    pub items: Option<Box<ParameterSpec<S>>>,
    #[serde(default, deserialize_with = "deserialize_node")]
    pub values: Option<Box<ParameterSpec<S>>>,
    #[serde(default, deserialize_with = "deserialize_properties")]
    pub properties: Vec<ParameterSpec<S>>,
    #[serde(flatten)]
    pub source: S,
}

pub type InputParameterSpec = ParameterSpec<InputSource>;
pub type OutputParameterSpec = ParameterSpec<OutputSource>;

impl<S> ParameterSpec<S> {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind
            .as_deref()
            .map(|k| k.trim().eq_ignore_ascii_case(kind))
            .unwrap_or(false)
    }

    pub fn kind_or_default(&self) -> &str {
        self.kind.as_deref().unwrap_or("string")
    }

    pub fn max_length(&self) -> Option<usize> {
        let parsed = match self.max_length.as_ref()? {
            Value::Number(num) => num.as_u64().map(|n| n as usize),
            Value::String(text) => text.trim().parse::<usize>().ok(),
            _ => None,
        };
        parsed.filter(|n| *n > 0)
    }

    pub fn carries_constant(&self) -> bool {
        self.constant.is_some()
            || self.items.as_deref().is_some_and(|i| i.carries_constant())
            || self.values.as_deref().is_some_and(|v| v.carries_constant())
            || self.properties.iter().any(|p| p.carries_constant())
    }
}

impl InputParameterSpec {
    pub fn location(&self) -> ParameterLocation {
        self.source.location
    }

    pub fn template(&self) -> Option<&str> {
        self.source.template.as_deref().filter(|t| !t.is_empty())
    }
}

impl OutputParameterSpec {
    pub fn mapping(&self) -> Option<&str> {
        self.source.mapping.as_deref()
    }
}

fn deserialize_node<'de, D, S>(deserializer: D) -> Result<Option<Box<ParameterSpec<S>>>, D::Error>
where
    D: Deserializer<'de>,
    S: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(node) => serde_json::from_value(node)
            .map(|node| Some(Box::new(node)))
            .map_err(D::Error::custom),
    }
}

// `items` may be a single node or a list whose first entry describes every element.
fn deserialize_items<'de, D, S>(deserializer: D) -> Result<Option<Box<ParameterSpec<S>>>, D::Error>
where
    D: Deserializer<'de>,
    S: DeserializeOwned,
{
    let node = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(list)) => match list.into_iter().next() {
            Some(first) => first,
            None => return Ok(None),
        },
        Some(node) => node,
    };
    serde_json::from_value(node)
        .map(|node| Some(Box::new(node)))
        .map_err(D::Error::custom)
}

// `properties` may be an ordered list of named nodes or a map keyed by name.
fn deserialize_properties<'de, D, S>(deserializer: D) -> Result<Vec<ParameterSpec<S>>, D::Error>
where
    D: Deserializer<'de>,
    S: DeserializeOwned,
{
    let nodes: Vec<Value> = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(list)) => list,
        Some(Value::Object(map)) => map
            .into_iter()
            .map(|(name, node)| match node {
                Value::Object(mut fields) => {
                    fields
                        .entry("name".to_string())
                        .or_insert(Value::String(name));
                    Value::Object(fields)
                }
                _ => serde_json::json!({ "name": name }),
            })
            .collect(),
        Some(other) => {
            return Err(D::Error::custom(format!(
                "properties must be a list or a map, got {}",
                other
            )))
        }
    };
    nodes
        .into_iter()
        .map(|node| serde_json::from_value(node).map_err(D::Error::custom))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn input_location_defaults_to_body() {
        let param: InputParameterSpec =
            serde_json::from_value(json!({"name": "q", "in": "Header"})).expect("parse");
        assert_eq!(param.location(), ParameterLocation::Header);
        let param: InputParameterSpec =
            serde_json::from_value(json!({"name": "payload"})).expect("parse");
        assert_eq!(param.location(), ParameterLocation::Body);
    }

    #[test]
    fn property_maps_inject_names_in_order() {
        let param: OutputParameterSpec = serde_json::from_value(json!({
            "type": "object",
            "properties": {
                "zeta": {"type": "string", "mapping": "$.z"},
                "alpha": {"mapping": "$.a"}
            }
        }))
        .expect("parse");
        let names: Vec<&str> = param.properties.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(param.properties[1].mapping(), Some("$.a"));
    }

    #[test]
    fn items_list_uses_first_entry() {
        let param: OutputParameterSpec = serde_json::from_value(json!({
            "type": "array",
            "mapping": "$.rows",
            "items": [{"type": "string", "mapping": "$.id"}]
        }))
        .expect("parse");
        assert_eq!(
            param.items.as_deref().and_then(|i| i.mapping()),
            Some("$.id")
        );
    }

    #[test]
    fn max_length_accepts_text_and_numbers() {
        let parse = |raw: Value| -> Option<usize> {
            let param: OutputParameterSpec =
                serde_json::from_value(json!({"maxLength": raw})).expect("parse");
            param.max_length()
        };
        assert_eq!(parse(json!("5")), Some(5));
        assert_eq!(parse(json!(3)), Some(3));
        assert_eq!(parse(json!("five")), None);
        assert_eq!(parse(json!(0)), None);
    }

    #[test]
    fn nested_constants_are_detected() {
        let param: OutputParameterSpec = serde_json::from_value(json!({
            "type": "object",
            "properties": [{"name": "inner", "type": "object",
                "properties": [{"name": "flag", "const": "on"}]}]
        }))
        .expect("parse");
        assert!(param.carries_constant());
    }
}
