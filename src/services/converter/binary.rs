use super::{ConvertError, RawFormat};
use apache_avro::Schema;
use prost_reflect::{DescriptorPool, DynamicMessage, SerializeOptions};
use serde_json::Value;

const AVRO_CONTAINER_MAGIC: &[u8] = b"Obj\x01";

fn invalid_schema(format: RawFormat, path: &str, err: impl std::fmt::Display) -> ConvertError {
    ConvertError::InvalidSchema {
        format: format.label(),
        path: path.to_string(),
        message: err.to_string(),
    }
}

// The root message is the first one declared in the schema file.
pub fn decode_protobuf(path: &str, source: &str, payload: &[u8]) -> Result<Value, ConvertError> {
    let format = RawFormat::Protobuf;
    let file = protox_parse::parse(path, source).map_err(|err| invalid_schema(format, path, err))?;
    let mut pool = DescriptorPool::new();
    pool.add_file_descriptor_proto(file)
        .map_err(|err| invalid_schema(format, path, err))?;
    let descriptor = pool
        .files()
        .next()
        .and_then(|file| file.messages().next())
        .ok_or_else(|| invalid_schema(format, path, "schema declares no message"))?;

    let message = DynamicMessage::decode(descriptor, payload)
        .map_err(|err| ConvertError::payload(format, err))?;
    let options = SerializeOptions::new()
        .use_proto_field_name(true)
        .stringify_64_bit_integers(false);
    message
        .serialize_with_options(serde_json::value::Serializer, &options)
        .map_err(|err| ConvertError::payload(format, err))
}

fn avro_to_json(value: apache_avro::types::Value) -> Result<Value, ConvertError> {
    Value::try_from(value).map_err(|err| ConvertError::payload(RawFormat::Avro, err))
}

pub fn decode_avro(path: &str, source: &str, payload: &[u8]) -> Result<Value, ConvertError> {
    let format = RawFormat::Avro;
    let schema = Schema::parse_str(source).map_err(|err| invalid_schema(format, path, err))?;

    if payload.starts_with(AVRO_CONTAINER_MAGIC) {
        let reader = apache_avro::Reader::with_schema(&schema, payload)
            .map_err(|err| ConvertError::payload(format, err))?;
        let mut records = Vec::new();
        for value in reader {
            let value = value.map_err(|err| ConvertError::payload(format, err))?;
            records.push(avro_to_json(value)?);
        }
        return Ok(Value::Array(records));
    }

    let mut reader = payload;
    let value = apache_avro::from_avro_datum(&schema, &mut reader, None)
        .map_err(|err| ConvertError::payload(format, err))?;
    avro_to_json(value)
}
