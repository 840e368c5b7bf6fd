use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;

const REDACTION: &str = "[REDACTED]";

static SENSITIVE_HEADER_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "authorization",
        "proxy-authorization",
        "cookie",
        "set-cookie",
        "x-api-key",
        "api-key",
        "apikey",
        "x-auth-token",
        "x-access-token",
    ]
    .into_iter()
    .collect()
});

static SENSITIVE_QUERY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([?&](?:api[_-]?key|key|token|access[_-]?token|secret|password)=)[^&#]*")
        .expect("query redaction regex")
});

pub fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADER_KEYS.contains(name.trim().to_lowercase().as_str())
}

fn is_secret_key(name: &str, secret_keys: &[String]) -> bool {
    secret_keys
        .iter()
        .any(|key| key.trim().eq_ignore_ascii_case(name.trim()))
}

pub fn redact_headers(headers: &[(String, String)], secret_keys: &[String]) -> Value {
    let mut out = Map::new();
    for (name, value) in headers {
        let shown = if is_sensitive_header(name) || is_secret_key(name, secret_keys) {
            REDACTION.to_string()
        } else {
            value.clone()
        };
        out.insert(name.clone(), Value::String(shown));
    }
    Value::Object(out)
}

pub fn redact_url(url: &str, secret_keys: &[String]) -> String {
    let masked = SENSITIVE_QUERY_PATTERN
        .replace_all(url, format!("${{1}}{}", REDACTION).as_str())
        .into_owned();
    if secret_keys.is_empty() {
        return masked;
    }
    let Some(split) = masked.find('?') else {
        return masked;
    };
    let (base, rest) = (&masked[..split], &masked[split + 1..]);
    let (query, fragment) = match rest.split_once('#') {
        Some((query, fragment)) => (query, Some(fragment)),
        None => (rest, None),
    };
    let pairs: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, _)) if is_secret_query_name(name, secret_keys) => {
                format!("{}={}", name, REDACTION)
            }
            _ => pair.to_string(),
        })
        .collect();
    let mut out = format!("{}?{}", base, pairs.join("&"));
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

fn is_secret_query_name(raw: &str, secret_keys: &[String]) -> bool {
    let decoded: String = url::form_urlencoded::parse(format!("{}=", raw).as_bytes())
        .next()
        .map(|(name, _)| name.into_owned())
        .unwrap_or_else(|| raw.to_string());
    is_secret_key(&decoded, secret_keys)
}
