mod binary;
mod delimited;
mod schema;
mod xml;

use crate::errors::EngineError;
use serde_json::Value;

pub use schema::load_schema;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("A schema is required to decode {0} payloads")]
    SchemaRequired(&'static str),
    #[error("Schema not found: {0}")]
    SchemaNotFound(String),
    #[error("Invalid {format} schema {path}: {message}")]
    InvalidSchema {
        format: &'static str,
        path: String,
        message: String,
    },
    #[error("Failed to parse {format} payload: {message}")]
    Payload {
        format: &'static str,
        message: String,
    },
}

impl ConvertError {
    pub(crate) fn payload(format: RawFormat, err: impl std::fmt::Display) -> Self {
        ConvertError::Payload {
            format: format.label(),
            message: err.to_string(),
        }
    }
}

impl From<ConvertError> for EngineError {
    fn from(err: ConvertError) -> Self {
        EngineError::conversion(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawFormat {
    Json,
    Xml,
    Yaml,
    Csv,
    Protobuf,
    Avro,
}

impl RawFormat {
    pub fn parse(hint: Option<&str>) -> Result<Self, ConvertError> {
        let Some(hint) = hint.map(str::trim).filter(|h| !h.is_empty()) else {
            return Ok(RawFormat::Json);
        };
        match hint.to_lowercase().as_str() {
            "json" => Ok(RawFormat::Json),
            "xml" => Ok(RawFormat::Xml),
            "yaml" | "yml" => Ok(RawFormat::Yaml),
            "csv" => Ok(RawFormat::Csv),
            "protobuf" | "proto" => Ok(RawFormat::Protobuf),
            "avro" => Ok(RawFormat::Avro),
            _ => Err(ConvertError::UnsupportedFormat(hint.to_string())),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RawFormat::Json => "JSON",
            RawFormat::Xml => "XML",
            RawFormat::Yaml => "YAML",
            RawFormat::Csv => "CSV",
            RawFormat::Protobuf => "Protobuf",
            RawFormat::Avro => "Avro",
        }
    }
}

fn is_blank(payload: &[u8]) -> bool {
    payload.iter().all(u8::is_ascii_whitespace)
}

pub fn convert(
    format: Option<&str>,
    schema: Option<&str>,
    payload: &[u8],
) -> Result<Value, ConvertError> {
    let format = RawFormat::parse(format)?;
    match format {
        RawFormat::Json => {
            if is_blank(payload) {
                return Ok(Value::Null);
            }
            serde_json::from_slice(payload).map_err(|err| ConvertError::payload(format, err))
        }
        RawFormat::Yaml => {
            if is_blank(payload) {
                return Ok(Value::Null);
            }
            serde_yaml::from_slice(payload).map_err(|err| ConvertError::payload(format, err))
        }
        RawFormat::Xml => xml::parse_xml(payload),
        RawFormat::Csv => delimited::parse_csv(payload),
        RawFormat::Protobuf | RawFormat::Avro => {
            let reference = schema
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or(ConvertError::SchemaRequired(format.label()))?;
            let source = load_schema(reference)?;
            if format == RawFormat::Protobuf {
                binary::decode_protobuf(reference, &source, payload)
            } else {
                binary::decode_avro(reference, &source, payload)
            }
        }
    }
}
