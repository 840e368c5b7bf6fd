#![allow(dead_code)]

use async_trait::async_trait;
use capgate::errors::EngineError;
use capgate::managers::orchestrator::Orchestrator;
use capgate::services::exchange::{Headers, OutboundRequest, OutboundResponse};
use capgate::services::http_client::HttpTransport;
use capgate::services::logger::Logger;
use capgate::spec::{parse_capability, CapabilityDocument, DocumentFormat};
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub fn response(status: u16, content_type: &str, body: &str) -> OutboundResponse {
    let mut headers = Headers::new();
    headers.set("Content-Type", content_type);
    OutboundResponse {
        status,
        headers,
        body: body.to_string().into(),
    }
}

pub fn json_response(status: u16, body: serde_json::Value) -> OutboundResponse {
    response(status, "application/json", &body.to_string())
}

/// Records every outbound request and answers from routes matched by URL substring.
#[derive(Default)]
pub struct MockTransport {
    routes: StdMutex<Vec<(String, OutboundResponse)>>,
    requests: StdMutex<Vec<OutboundRequest>>,
    failure: StdMutex<Option<String>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn route(self: &Arc<Self>, url_fragment: &str, response: OutboundResponse) -> Arc<Self> {
        self.routes
            .lock()
            .unwrap()
            .push((url_fragment.to_string(), response));
        Arc::clone(self)
    }

    pub fn fail_with(self: &Arc<Self>, message: &str) -> Arc<Self> {
        *self.failure.lock().unwrap() = Some(message.to_string());
        Arc::clone(self)
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> OutboundRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no outbound request recorded")
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: OutboundRequest) -> Result<OutboundResponse, EngineError> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(EngineError::backend(message));
        }
        let routes = self.routes.lock().unwrap();
        Ok(routes
            .iter()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| response(404, "text/plain", "not found")))
    }
}

pub fn document(yaml: &str) -> CapabilityDocument {
    parse_capability(yaml, DocumentFormat::Yaml).expect("capability fixture must parse")
}

pub fn orchestrator(yaml: &str, transport: Arc<MockTransport>) -> Arc<Orchestrator> {
    let document = document(yaml);
    Arc::new(Orchestrator::new(
        Arc::new(document.capability),
        transport,
        Logger::new("test"),
    ))
}

pub const USERS_CAPABILITY: &str = r#"
naftiko: "0.4"
info:
  label: Users
capability:
  exposes:
    - type: api
      port: 8081
      namespace: users-api
      resources:
        - path: /users/{{id}}
          name: user
          inputParameters:
            - name: id
              in: path
          operations:
            - method: GET
              name: get-user
              call:
                operation: users.get-user
                with:
                  token: s3cr3t
              outputParameters:
                - type: object
                  properties:
                    - name: name
                      mapping: $.name
        - path: /status
          operations:
            - method: GET
              outputParameters:
                - name: status
                  type: string
                  const: ok
        - path: /broken
          operations:
            - method: GET
              call:
                operation: users.missing
        - path: /strict/{{id}}
          operations:
            - method: GET
              call:
                operation: users.get-user
        - path: /proxy/{{path}}
          forward:
            targetNamespace: proxy
            trustedHeaders: [X-Trace]
        - path: /legacy
          operations:
            - method: GET
              call:
                operation: missing.op
              outputParameters:
                - name: status
                  type: string
                  const: retired
                - name: replacement
                  type: string
                  const: /users
  consumes:
    - type: http
      namespace: users
      baseUri: https://users.example.com
      inputParameters:
        - name: X-Client
          in: header
          const: capgate
      authentication:
        type: bearer
        token: "{{token}}"
      resources:
        - path: /users/{{id}}
          name: user
          operations:
            - method: GET
              name: get-user
    - type: http
      namespace: proxy
      baseUri: https://proxy.example.com/
      inputParameters:
        - name: X-Client
          in: header
          const: capgate
"#;

pub const TOOLS_CAPABILITY: &str = r#"
naftiko: "0.4"
capability:
  exposes:
    - type: mcp
      namespace: weather-tools
      description: Weather lookups
      tools:
        - name: get-forecast
          description: Forecast for a city
          inputParameters:
            - name: city
              description: City name
            - name: days
              type: number
          call:
            operation: weather.forecast
          outputParameters:
            - name: summary
              type: string
              mapping: $.forecast.summary
        - name: raw-forecast
          call:
            operation: weather.forecast
        - name: canned
          outputParameters:
            - name: answer
              const: 42
        - name: dangling
          call:
            operation: weather.nowhere
  consumes:
    - type: http
      namespace: weather
      baseUri: https://weather.example.com
      authentication:
        type: apikey
        key: api_key
        value: k e y
        placement: query
      resources:
        - path: /forecast/{{city}}
          operations:
            - method: GET
              name: forecast
              inputParameters:
                - name: days
                  in: query
"#;

pub const STEPS_CAPABILITY: &str = r#"
naftiko: "0.4"
capability:
  exposes:
    - type: api
      resources:
        - path: /orders/{{orderId}}
          inputParameters:
            - name: orderId
              in: path
          operations:
            - method: GET
              call:
                operation: shop.invoice
                with:
                  format: html
              steps:
                - call:
                    operation: shop.order
                - call:
                    operation: shop.invoice
                  with:
                    format: pdf
              outputParameters:
                - name: invoice
                  type: object
                  mapping: $
                  properties:
                    - name: number
                      mapping: $.number
                    - name: total
                      type: number
                      mapping: $.total
  consumes:
    - type: http
      namespace: shop
      baseUri: https://shop.example.com
      resources:
        - path: /orders/{{orderId}}
          operations:
            - method: GET
              name: order
              inputParameters:
                - name: trace
                  in: header
                  template: "order-{{orderId}}"
        - path: /invoices/{{orderId}}
          operations:
            - method: GET
              name: invoice
              inputParameters:
                - name: X-Trace
                  in: header
                  template: "{{trace}}"
                - name: format
                  in: query
"#;
