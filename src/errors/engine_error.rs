use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineErrorKind {
    Config,
    Dispatch,
    Template,
    Backend,
    Conversion,
    Internal,
}

impl EngineErrorKind {
    pub fn status(self) -> u16 {
        match self {
            EngineErrorKind::Dispatch | EngineErrorKind::Template => 400,
            _ => 500,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
            details: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Config, "CONFIG", message)
    }

    pub fn dispatch(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Dispatch, "INVALID_CALL", message)
    }

    pub fn template(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Template, "UNRESOLVED_TEMPLATE", message)
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Backend, "BACKEND", message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Backend, "TIMEOUT", message)
    }

    pub fn conversion(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Conversion, "CONVERSION", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Internal, "INTERNAL", message)
    }

    pub fn status(&self) -> u16 {
        self.kind.status()
    }

    pub fn is_client_error(&self) -> bool {
        self.status() < 500
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::internal(err.to_string())
    }
}
