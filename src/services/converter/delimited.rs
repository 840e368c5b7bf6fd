use super::{ConvertError, RawFormat};
use serde_json::{Map, Value};

pub fn parse_csv(payload: &[u8]) -> Result<Value, ConvertError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(payload);
    let headers = reader
        .headers()
        .map_err(|err| ConvertError::payload(RawFormat::Csv, err))?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| ConvertError::payload(RawFormat::Csv, err))?;
        let mut row = Map::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            row.insert(header.to_string(), Value::String(field.to_string()));
        }
        rows.push(Value::Object(row));
    }
    Ok(Value::Array(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_row_keys_every_record() {
        let parsed = parse_csv(b"id,name\n1,Ann\n2,\"Lee, Bob\"\n").expect("csv");
        assert_eq!(
            parsed,
            json!([{"id": "1", "name": "Ann"}, {"id": "2", "name": "Lee, Bob"}])
        );
    }

    #[test]
    fn header_only_payload_is_empty_array() {
        assert_eq!(parse_csv(b"id,name\n").expect("csv"), json!([]));
    }
}
