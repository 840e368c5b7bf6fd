use crate::constants::env as env_keys;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    fn from_env() -> Self {
        std::env::var(env_keys::LOG_LEVEL)
            .or_else(|_| std::env::var(env_keys::LOG_LEVEL_FALLBACK))
            .ok()
            .and_then(|raw| LogLevel::parse(&raw))
            .unwrap_or(LogLevel::Info)
    }

    fn rank(self) -> u8 {
        match self {
            LogLevel::Error => 0,
            LogLevel::Warn => 1,
            LogLevel::Info => 2,
            LogLevel::Debug => 3,
        }
    }

    fn label(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    fn allows(self, other: LogLevel) -> bool {
        other.rank() <= self.rank()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        match std::env::var(env_keys::LOG_FORMAT)
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Logger {
    context: String,
    level: LogLevel,
    format: LogFormat,
}

impl Logger {
    pub fn new(context: &str) -> Self {
        Self {
            context: context.to_string(),
            level: LogLevel::from_env(),
            format: LogFormat::from_env(),
        }
    }

    pub fn child(&self, suffix: &str) -> Self {
        let context = if suffix.is_empty() {
            self.context.clone()
        } else {
            format!("{}:{}", self.context, suffix)
        };
        Self {
            context,
            level: self.level,
            format: self.format,
        }
    }

    pub fn set_level(&mut self, level: LogLevel) {
        self.level = level;
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        self.level.allows(level)
    }

    fn render(&self, level: LogLevel, message: &str, meta: Option<&Value>) -> String {
        let timestamp = chrono::Utc::now().to_rfc3339();
        let meta = meta.filter(|m| !m.is_null());
        match self.format {
            LogFormat::Json => {
                let mut line = serde_json::json!({
                    "ts": timestamp,
                    "level": level.label(),
                    "context": self.context,
                    "message": message,
                });
                if let (Some(meta), Some(obj)) = (meta, line.as_object_mut()) {
                    obj.insert("meta".to_string(), meta.clone());
                }
                line.to_string()
            }
            LogFormat::Text => {
                let meta_suffix = meta.map(|m| format!(" {}", m)).unwrap_or_default();
                format!(
                    "[{}] {} [{}] {}{}",
                    timestamp,
                    level.label(),
                    self.context,
                    message,
                    meta_suffix
                )
            }
        }
    }

    fn log(&self, level: LogLevel, message: &str, meta: Option<&Value>) {
        if !self.enabled(level) {
            return;
        }
        eprintln!("{}", self.render(level, message, meta));
    }

    pub fn error(&self, message: &str, meta: Option<&Value>) {
        self.log(LogLevel::Error, message, meta);
    }

    pub fn warn(&self, message: &str, meta: Option<&Value>) {
        self.log(LogLevel::Warn, message, meta);
    }

    pub fn info(&self, message: &str, meta: Option<&Value>) {
        self.log(LogLevel::Info, message, meta);
    }

    pub fn debug(&self, message: &str, meta: Option<&Value>) {
        self.log(LogLevel::Debug, message, meta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_filter_orders_by_severity() {
        assert!(LogLevel::Info.allows(LogLevel::Error));
        assert!(LogLevel::Info.allows(LogLevel::Info));
        assert!(!LogLevel::Info.allows(LogLevel::Debug));
        assert!(LogLevel::Debug.allows(LogLevel::Debug));
    }

    #[test]
    fn child_contexts_are_colon_joined() {
        let logger = Logger::new("capgate").child("api").child("users");
        let line = logger.render(LogLevel::Info, "ready", None);
        assert!(line.contains("[capgate:api:users] ready"));
    }

    #[test]
    fn json_format_embeds_meta() {
        let mut logger = Logger::new("capgate");
        logger.format = LogFormat::Json;
        let line = logger.render(
            LogLevel::Warn,
            "slow backend",
            Some(&serde_json::json!({"ms": 1200})),
        );
        let parsed: Value = serde_json::from_str(&line).expect("json line");
        assert_eq!(parsed["level"], "WARN");
        assert_eq!(parsed["meta"]["ms"], 1200);
    }
}
