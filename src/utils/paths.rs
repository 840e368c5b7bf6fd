use crate::constants::{env as env_keys, network};
use std::env;
use std::path::{Path, PathBuf};

fn normalize_env_value(value: Option<String>) -> Option<String> {
    let raw = value?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_lowercase();
    if lowered == "undefined" || lowered == "null" {
        return None;
    }
    Some(trimmed.to_string())
}

pub fn resolve_capability_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    normalize_env_value(env::var(env_keys::CAPABILITY_PATH).ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env_keys::DEFAULT_CAPABILITY_FILE))
}

pub fn resolve_schema_dir() -> Option<PathBuf> {
    normalize_env_value(env::var(env_keys::SCHEMA_DIR).ok()).map(PathBuf::from)
}

pub fn resolve_http_timeout_ms() -> u64 {
    normalize_env_value(env::var(env_keys::HTTP_TIMEOUT_MS).ok())
        .and_then(|raw| raw.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .unwrap_or(network::TIMEOUT_API_REQUEST_MS)
}

pub fn resolve_schema_path(reference: &str) -> PathBuf {
    let relative = Path::new(reference);
    if relative.is_absolute() {
        return relative.to_path_buf();
    }
    match resolve_schema_dir() {
        Some(dir) => dir.join(relative),
        None => relative.to_path_buf(),
    }
}
