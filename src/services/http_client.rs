use crate::constants::{http, network};
use crate::errors::EngineError;
use crate::services::auth::{generate_cnonce, DigestChallenge};
use crate::services::exchange::{Headers, OutboundRequest, OutboundResponse};
use crate::services::logger::Logger;
use crate::utils::paths::resolve_http_timeout_ms;
use crate::utils::redact::{redact_headers, redact_url};
use crate::utils::text::preview_body;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use std::time::Duration;
use url::{Position, Url};

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<OutboundResponse, EngineError>;
}

pub struct ReqwestTransport {
    client: Client,
    logger: Logger,
}

impl ReqwestTransport {
    pub fn new(timeout_ms: u64, logger: Logger) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .connect_timeout(Duration::from_millis(network::TIMEOUT_CONNECTION_MS))
            .redirect(reqwest::redirect::Policy::limited(network::MAX_REDIRECTS))
            .build()
            .map_err(|err| EngineError::internal(format!("Failed to build HTTP client: {}", err)))?;
        Ok(Self { client, logger })
    }

    pub fn from_env(logger: Logger) -> Result<Self, EngineError> {
        Self::new(resolve_http_timeout_ms(), logger)
    }

    async fn send_once(
        &self,
        request: &OutboundRequest,
        authorization: Option<String>,
    ) -> Result<OutboundResponse, EngineError> {
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|_| {
            EngineError::dispatch(format!("Invalid HTTP method: {}", request.method))
        })?;
        let url = Url::parse(&request.url)
            .map_err(|err| EngineError::dispatch(format!("Invalid URL {}: {}", request.url, err)))?;

        let mut headers = headers_to_headermap(&request.headers)?;
        if let Some(value) = authorization {
            let value = HeaderValue::from_str(&value)
                .map_err(|_| EngineError::internal("Invalid digest authorization header"))?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = request.body.clone() {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let headers = headermap_to_headers(response.headers());
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(OutboundResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<OutboundResponse, EngineError> {
        self.logger.debug(
            "outbound request",
            Some(&serde_json::json!({
                "method": request.method,
                "url": redact_url(&request.url, &request.secret_keys),
                "headers": redact_headers(request.headers.as_pairs(), &request.secret_keys),
            })),
        );
        let response = self.send_once(&request, None).await?;
        let response = if response.status == 401 {
            self.answer_digest(&request, response).await?
        } else {
            response
        };
        self.logger.debug(
            "backend response",
            Some(&serde_json::json!({
                "status": response.status,
                "body": preview_body(&response.body, http::LOG_PREVIEW_BYTES),
            })),
        );
        Ok(response)
    }
}

impl ReqwestTransport {
    async fn answer_digest(
        &self,
        request: &OutboundRequest,
        response: OutboundResponse,
    ) -> Result<OutboundResponse, EngineError> {
        let Some(credentials) = request.digest.as_ref() else {
            return Ok(response);
        };
        let Some(challenge) = response
            .headers
            .get("www-authenticate")
            .and_then(DigestChallenge::parse)
        else {
            return Ok(response);
        };
        let authorization = challenge.authorization(
            credentials,
            &request.method,
            &request_uri(&request.url),
            &generate_cnonce(),
        );
        self.logger.debug("answering digest challenge", None);
        self.send_once(request, Some(authorization)).await
    }
}

fn request_uri(raw: &str) -> String {
    Url::parse(raw)
        .map(|url| url[Position::BeforePath..].to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn headers_to_headermap(headers: &Headers) -> Result<HeaderMap, EngineError> {
    let mut map = HeaderMap::new();
    for (key, value) in headers.iter() {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| EngineError::dispatch(format!("Invalid header name: {}", key)))?;
        let val = HeaderValue::from_str(value)
            .map_err(|_| EngineError::dispatch(format!("Invalid value for header {}", key)))?;
        map.append(name, val);
    }
    Ok(map)
}

fn headermap_to_headers(headers: &HeaderMap) -> Headers {
    headers
        .iter()
        .filter_map(|(key, value)| {
            value
                .to_str()
                .ok()
                .map(|text| (key.as_str().to_string(), text.to_string()))
        })
        .collect()
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> EngineError {
    if err.is_timeout() {
        return EngineError::timeout("HTTP request timed out");
    }
    EngineError::backend(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uri_keeps_path_and_query() {
        assert_eq!(
            request_uri("https://api.test/dir/index.html?x=1"),
            "/dir/index.html?x=1"
        );
    }

    #[test]
    fn invalid_header_names_are_rejected() {
        let mut headers = Headers::new();
        headers.set("bad header", "x");
        assert!(headers_to_headermap(&headers).is_err());
    }
}
