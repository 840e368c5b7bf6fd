mod common;
use common::{document, ENV_LOCK, USERS_CAPABILITY};

use capgate::app::App;
use capgate::services::logger::Logger;
use capgate::spec::{
    load_capability, parse_capability, AuthenticationSpec, DocumentFormat, ExposedInterfaceSpec,
};
use capgate::utils::paths::resolve_capability_path;
use std::path::{Path, PathBuf};

fn tmp_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("capgate-{}-{}", uuid::Uuid::new_v4(), name))
}

#[test]
fn yaml_documents_link_operations_to_resources() {
    let document = document(USERS_CAPABILITY);
    assert_eq!(document.version.as_deref(), Some("0.4"));
    let client = document.capability.client("users").expect("users client");
    let target = client.operation("get-user").expect("operation");
    assert_eq!(target.resource.path, "/users/{{id}}");
    assert_eq!(target.reference(), "users.get-user");
    assert!(matches!(
        client.authentication,
        Some(AuthenticationSpec::Bearer(_))
    ));
    assert_eq!(document.capability.api_servers().count(), 1);
}

#[test]
fn empty_exposes_or_consumes_are_rejected() {
    let err = parse_capability(
        "capability:\n  exposes: []\n  consumes:\n    - type: http\n      namespace: a\n      baseUri: http://a\n",
        DocumentFormat::Yaml,
    )
    .expect_err("no exposes");
    assert!(err.message.contains("expose"));
    assert_eq!(err.status(), 500);

    let err = parse_capability(
        r#"{"capability": {"exposes": [{"type": "api"}], "consumes": []}}"#,
        DocumentFormat::Json,
    )
    .expect_err("no consumes");
    assert!(err.message.contains("consume"));
}

#[test]
fn unknown_authentication_schemes_are_tolerated() {
    let document = document(
        r#"
capability:
  exposes:
    - type: mcp
      namespace: t
      transport: stdio
  consumes:
    - type: http
      namespace: legacy
      baseUri: http://legacy
      authentication:
        type: kerberos
"#,
    );
    let client = document.capability.client("legacy").expect("client");
    assert!(matches!(
        client.authentication,
        Some(AuthenticationSpec::Unsupported)
    ));
    assert!(matches!(
        document.capability.exposes[0],
        ExposedInterfaceSpec::Mcp(_)
    ));
}

#[test]
fn load_capability_reports_the_file_path() {
    let path = tmp_file("broken.yaml");
    std::fs::write(&path, "capability: [").expect("write");
    let err = load_capability(&path).expect_err("invalid yaml");
    assert!(err.message.contains(&path.display().to_string()));
    let _ = std::fs::remove_file(&path);

    let missing = load_capability(Path::new("/nonexistent/capgate.yaml")).expect_err("missing");
    assert!(missing.message.contains("Unable to read capability file"));
}

#[test]
fn json_documents_load_by_extension() {
    let path = tmp_file("cap.json");
    std::fs::write(
        &path,
        r#"{"naftiko": "0.4", "capability": {
            "exposes": [{"type": "api", "port": 9090, "resources": [{"path": "/ping"}]}],
            "consumes": [{"type": "http", "namespace": "svc", "baseUri": "http://svc"}]
        }}"#,
    )
    .expect("write");
    let document = load_capability(&path).expect("json capability");
    let _ = std::fs::remove_file(&path);

    let app = App::initialize(document, Logger::new("test")).expect("app");
    let summary = app.summary();
    assert_eq!(summary["exposes"][0]["address"], "localhost:9090");
    assert_eq!(summary["exposes"][0]["resources"][0], "/ping");
    assert_eq!(summary["consumes"][0]["namespace"], "svc");
}

#[tokio::test]
async fn capability_path_prefers_argument_then_environment() {
    let _guard = ENV_LOCK.lock().await;
    let previous = std::env::var("CAPGATE_CAPABILITY").ok();

    std::env::set_var("CAPGATE_CAPABILITY", "/etc/capgate/main.yaml");
    assert_eq!(
        resolve_capability_path(Some(Path::new("local.yaml"))),
        PathBuf::from("local.yaml")
    );
    assert_eq!(
        resolve_capability_path(None),
        PathBuf::from("/etc/capgate/main.yaml")
    );

    std::env::set_var("CAPGATE_CAPABILITY", "undefined");
    assert_eq!(resolve_capability_path(None), PathBuf::from("capability.yaml"));

    match previous {
        Some(value) => std::env::set_var("CAPGATE_CAPABILITY", value),
        None => std::env::remove_var("CAPGATE_CAPABILITY"),
    }
}
