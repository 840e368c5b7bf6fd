use crate::constants::http as http_consts;
use bytes::Bytes;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.0.retain(|(key, _)| !key.eq_ignore_ascii_case(&name));
        self.0.push((name, value.into()));
    }

    pub fn set_default(&mut self, name: &str, value: &str) {
        if !self.contains(name) {
            self.0.push((name.to_string(), value.to_string()));
        }
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn remove(&mut self, name: &str) {
        self.0.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn as_pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Headers {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    pub method: String,
    pub path: String,
    pub path_params: HashMap<String, String>,
    pub query: Vec<(String, String)>,
    pub headers: Headers,
    pub body: Bytes,
}

impl InboundRequest {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            path: path.to_string(),
            ..Self::default()
        }
    }

    pub fn with_path_param(mut self, name: &str, value: &str) -> Self {
        self.path_params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn query_string(&self) -> Option<String> {
        if self.query.is_empty() {
            return None;
        }
        serde_urlencoded::to_string(&self.query).ok()
    }

    pub fn json_body(&self) -> Option<Value> {
        if self.body.is_empty() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }
}

#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

impl GatewayResponse {
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    pub fn json(status: u16, value: &Value) -> Self {
        Self::with_content(status, http_consts::JSON_CONTENT_TYPE, value.to_string())
    }

    pub fn pretty_json(status: u16, value: &Value) -> Self {
        let body = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        Self::with_content(status, http_consts::JSON_CONTENT_TYPE, body)
    }

    pub fn text(status: u16, message: impl Into<String>) -> Self {
        Self::with_content(status, http_consts::TEXT_CONTENT_TYPE, message.into())
    }

    pub fn with_content(status: u16, content_type: &str, body: impl Into<Bytes>) -> Self {
        let mut headers = Headers::new();
        headers.set("Content-Type", content_type);
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn passthrough(response: &OutboundResponse) -> Self {
        let mut headers = Headers::new();
        if let Some(content_type) = response.headers.get("content-type") {
            headers.set("Content-Type", content_type);
        }
        Self {
            status: response.status,
            headers,
            body: response.body.clone(),
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }

    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Bytes>,
    pub digest: Option<DigestCredentials>,
    // Header or query names carrying configured credentials.
    pub secret_keys: Vec<String>,
}

impl OutboundRequest {
    pub fn new(method: &str, url: impl Into<String>) -> Self {
        Self {
            method: method.trim().to_uppercase(),
            url: url.into(),
            headers: Headers::new(),
            body: None,
            digest: None,
            secret_keys: Vec::new(),
        }
    }

    // Appends `name=value` with form encoding, picking `?` or `&` from the current URL.
    pub fn append_query(&mut self, name: &str, value: &str) {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        let name: String = url::form_urlencoded::byte_serialize(name.as_bytes()).collect();
        let value: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
        self.url = format!("{}{}{}={}", self.url, separator, name, value);
    }
}

#[derive(Debug, Clone, Default)]
pub struct OutboundResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

impl OutboundResponse {
    pub fn reason(&self) -> &'static str {
        reqwest::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("")
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
