use crate::errors::EngineError;
use crate::spec::CapabilityDocument;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .as_deref()
        {
            Some("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

pub fn parse_capability(text: &str, format: DocumentFormat) -> Result<CapabilityDocument, EngineError> {
    let document: CapabilityDocument = match format {
        DocumentFormat::Json => serde_json::from_str(text)
            .map_err(|err| EngineError::config(format!("Invalid capability JSON: {}", err)))?,
        DocumentFormat::Yaml => serde_yaml::from_str(text)
            .map_err(|err| EngineError::config(format!("Invalid capability YAML: {}", err)))?,
    };
    document.link()
}

pub fn load_capability(path: &Path) -> Result<CapabilityDocument, EngineError> {
    let text = std::fs::read_to_string(path).map_err(|err| {
        EngineError::config(format!(
            "Unable to read capability file {}: {}",
            path.display(),
            err
        ))
    })?;
    parse_capability(&text, DocumentFormat::from_path(path)).map_err(|err| {
        let message = format!("{} ({})", err.message, path.display());
        EngineError { message, ..err }
    })
}
