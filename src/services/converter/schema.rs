use super::ConvertError;
use crate::utils::paths::resolve_schema_path;
use include_dir::{include_dir, Dir};

static BUNDLED: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/resources");

fn bundled_key(reference: &str) -> &str {
    reference.trim_start_matches("./").trim_start_matches('/')
}

// Filesystem first, then the resources compiled into the binary.
pub fn load_schema(reference: &str) -> Result<String, ConvertError> {
    let path = resolve_schema_path(reference);
    if path.is_file() {
        return std::fs::read_to_string(&path).map_err(|err| ConvertError::InvalidSchema {
            format: "schema",
            path: path.display().to_string(),
            message: err.to_string(),
        });
    }
    let file = BUNDLED
        .get_file(bundled_key(reference))
        .ok_or_else(|| ConvertError::SchemaNotFound(reference.to_string()))?;
    file.contents_utf8()
        .map(str::to_string)
        .ok_or_else(|| ConvertError::InvalidSchema {
            format: "schema",
            path: reference.to_string(),
            message: "bundled schema is not valid UTF-8".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_schemas_are_found_by_relative_path() {
        let source = load_schema("schemas/test-records.avsc").expect("bundled avro schema");
        assert!(source.contains("\"record\""));
        assert!(load_schema("./schemas/test-records.proto").is_ok());
    }

    #[test]
    fn unknown_schemas_are_reported() {
        assert!(matches!(
            load_schema("schemas/nowhere.proto"),
            Err(ConvertError::SchemaNotFound(_))
        ));
    }
}
