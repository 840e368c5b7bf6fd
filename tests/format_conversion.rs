mod common;
use common::{orchestrator, response, MockTransport};

use apache_avro::types::Value as AvroValue;
use apache_avro::Schema;
use capgate::managers::api_operations::ApiOperationsHandler;
use capgate::services::converter::{convert, ConvertError};
use capgate::services::exchange::InboundRequest;
use serde_json::json;

#[test]
fn protobuf_payloads_decode_against_bundled_schema() {
    // RecordList { records: [Record { id: "a", title: "T", active: true }], total: 1 }
    let payload = [
        0x0A, 0x07, 0x0A, 0x01, b'a', 0x12, 0x01, b'T', 0x18, 0x01, 0x10, 0x01,
    ];
    let value = convert(
        Some("protobuf"),
        Some("schemas/test-records.proto"),
        &payload,
    )
    .expect("decoded");
    assert_eq!(
        value,
        json!({"records": [{"id": "a", "title": "T", "active": true}], "total": 1})
    );
}

#[test]
fn avro_datums_decode_against_bundled_schema() {
    let source = std::fs::read_to_string(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/resources/schemas/test-records.avsc"
    ))
    .expect("schema file");
    let schema = Schema::parse_str(&source).expect("schema");
    let record = AvroValue::Record(vec![
        ("id".to_string(), AvroValue::String("r1".to_string())),
        ("title".to_string(), AvroValue::String("First".to_string())),
        ("score".to_string(), AvroValue::Int(5)),
    ]);
    let datum = apache_avro::to_avro_datum(&schema, record).expect("encode");

    let value = convert(Some("AVRO"), Some("schemas/test-records.avsc"), &datum).expect("decoded");
    assert_eq!(value, json!({"id": "r1", "title": "First", "score": 5}));
}

#[test]
fn binary_formats_require_a_schema() {
    assert!(matches!(
        convert(Some("protobuf"), None, b"\x08\x01"),
        Err(ConvertError::SchemaRequired(_))
    ));
    assert!(matches!(
        convert(Some("avro"), Some("schemas/missing.avsc"), b"\x00"),
        Err(ConvertError::SchemaNotFound(_))
    ));
}

const XML_CAPABILITY: &str = r#"
capability:
  exposes:
    - type: api
      resources:
        - path: /books
          operations:
            - method: GET
              call:
                operation: library.books
              outputParameters:
                - name: titles
                  type: array
                  mapping: $.book
                  items:
                    type: object
                    properties:
                      - name: title
                        mapping: $.title
                        maxLength: 5
                      - name: id
                        mapping: $.id
        - path: /report
          operations:
            - method: GET
              call:
                operation: library.report
              outputParameters:
                - name: rows
                  type: array
                  mapping: $
  consumes:
    - type: http
      namespace: library
      baseUri: https://library.example.com
      resources:
        - path: /books
          operations:
            - method: GET
              name: books
              outputRawFormat: xml
        - path: /report.csv
          operations:
            - method: GET
              name: report
              outputRawFormat: csv
"#;

#[tokio::test]
async fn client_format_hint_drives_xml_conversion() {
    let transport = MockTransport::new().route(
        "/books",
        response(
            200,
            "application/xml",
            r#"<catalog><book id="1"><title>Dune Messiah</title></book><book id="2"><title>Emma</title></book></catalog>"#,
        ),
    );
    let handler = ApiOperationsHandler::new(orchestrator(XML_CAPABILITY, transport), 0, 0);

    let result = handler.handle(InboundRequest::new("GET", "/books")).await;

    assert_eq!(result.status, 200);
    assert_eq!(
        result.body_json(),
        Some(json!([
            {"title": "Dune ", "id": "1"},
            {"title": "Emma", "id": "2"}
        ]))
    );
}

#[tokio::test]
async fn csv_rows_become_objects_of_strings() {
    let transport = MockTransport::new().route(
        "/report.csv",
        response(200, "text/csv", "name,count\nalpha,3\nbeta,4\n"),
    );
    let handler = ApiOperationsHandler::new(orchestrator(XML_CAPABILITY, transport), 0, 1);

    let result = handler.handle(InboundRequest::new("GET", "/report")).await;

    assert_eq!(result.status, 200);
    assert_eq!(
        result.body_json(),
        Some(json!([
            {"name": "alpha", "count": "3"},
            {"name": "beta", "count": "4"}
        ]))
    );
}

#[tokio::test]
async fn malformed_payloads_fail_mapping() {
    let transport = MockTransport::new().route(
        "/books",
        response(200, "application/xml", "<catalog><book></catalog>"),
    );
    let handler = ApiOperationsHandler::new(orchestrator(XML_CAPABILITY, transport), 0, 0);

    let result = handler.handle(InboundRequest::new("GET", "/books")).await;

    assert_eq!(result.status, 500);
    let body = result.body_json().expect("json error");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to map output parameters"));
}
