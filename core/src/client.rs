//! Request plumbing shared by every warehouse operation.
//!
//! # Design
//! `Client` holds the base URL, the bearer token and a transport, and nothing
//! that changes between calls. Each round-trip is split into `build_*`
//! (produces an `HttpRequest` with both required headers), the transport's
//! `execute`, and `check_status` (accepts exactly 200). Resource operations
//! only format paths and decode bodies on top of `get` and `post`.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::transport::UreqTransport;
use crate::types::HealthResponse;

const HEALTH_ENDPOINT: &str = "/health";

/// Blocking client for the Data Warehouse API.
///
/// Safe to share between threads when the transport is; the default
/// [`UreqTransport`] is.
pub struct Client<T = UreqTransport> {
    base_url: String,
    api_key: String,
    transport: T,
}

impl Client<UreqTransport> {
    /// Create a client with a default ureq transport.
    ///
    /// Fails with `InvalidConfiguration` if `base_url` or `api_key` is empty.
    /// Performs no network I/O.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ApiError> {
        Self::with_transport(base_url, api_key, UreqTransport::new())
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url, &config.api_key)
    }

    /// Create a client from `DATA_WAREHOUSE_URL` and `DATA_WAREHOUSE_API_KEY`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_config(&ClientConfig::from_env()?)
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(base_url: &str, api_key: &str, transport: T) -> Result<Self, ApiError> {
        ClientConfig::new(base_url, api_key).validate()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            transport,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Check the service's health. A single point-in-time probe.
    pub fn get_health(&self) -> Result<HealthResponse, ApiError> {
        self.get(HEALTH_ENDPOINT)
            .and_then(|body| decode(&body))
            .map_err(|e| e.context("error retrieving health status"))
    }

    /// `path` is appended to the base URL verbatim; callers escape segments.
    pub(crate) fn build_get(&self, path: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}{path}", self.base_url),
            headers: self.headers(),
            body: None,
        }
    }

    pub(crate) fn build_post<P: Serialize>(
        &self,
        path: &str,
        payload: &P,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(payload).map_err(ApiError::SerializationError)?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}{path}", self.base_url),
            headers: self.headers(),
            body: Some(body),
        })
    }

    pub(crate) fn get(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let request = self.build_get(path);
        self.execute(&request)
    }

    pub(crate) fn post<P: Serialize>(&self, path: &str, payload: &P) -> Result<Vec<u8>, ApiError> {
        let request = self.build_post(path, payload)?;
        self.execute(&request)
    }

    fn execute(&self, request: &HttpRequest) -> Result<Vec<u8>, ApiError> {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let response = self.transport.execute(request).map_err(|e| {
            warn!(method = request.method.as_str(), url = %request.url, error = %e, "request failed");
            ApiError::TransportError(e)
        })?;
        debug!(status = response.status, bytes = response.body.len(), "received response");
        check_status(response).inspect_err(|e| {
            warn!(method = request.method.as_str(), url = %request.url, status = ?e.status(), "unexpected status");
        })
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Authorization".to_string(), format!("Bearer {}", self.api_key)),
        ]
    }
}

impl<T> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Accept exactly 200; anything else carries the raw body text back.
fn check_status(response: HttpResponse) -> Result<Vec<u8>, ApiError> {
    if response.status == 200 {
        return Ok(response.body);
    }
    Err(ApiError::UnexpectedStatus {
        status: response.status,
        body: String::from_utf8_lossy(&response.body).into_owned(),
    })
}

pub(crate) fn decode<D: DeserializeOwned>(body: &[u8]) -> Result<D, ApiError> {
    serde_json::from_slice(body).map_err(ApiError::DeserializationError)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io;

    use super::*;
    use crate::testing::RecordingTransport;

    const URL: &str = "http://localhost:8080";
    const KEY: &str = "test-key";

    fn client(transport: RecordingTransport) -> Client<RecordingTransport> {
        Client::with_transport(URL, KEY, transport).unwrap()
    }

    #[test]
    fn new_rejects_empty_url() {
        let err = Client::new("", KEY).unwrap_err();
        assert!(matches!(err, ApiError::InvalidConfiguration(_)));
    }

    #[test]
    fn new_rejects_empty_api_key() {
        let err = Client::new(URL, "").unwrap_err();
        assert!(matches!(err, ApiError::InvalidConfiguration(_)));
    }

    #[test]
    fn new_rejects_both_empty() {
        let err = Client::new("", "").unwrap_err();
        assert!(matches!(err, ApiError::InvalidConfiguration(_)));
    }

    #[test]
    fn new_performs_no_io() {
        let transport = RecordingTransport::new();
        let client = client(transport);
        assert!(client.transport().requests().is_empty());
    }

    #[test]
    fn new_with_default_transport_succeeds() {
        // Port 9 is discard; nothing is contacted during construction anyway.
        let client = Client::new("http://127.0.0.1:9", KEY).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9");
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = Client::with_transport("http://localhost:8080/", KEY, RecordingTransport::new()).unwrap();
        let req = client.build_get("/health");
        assert_eq!(req.url, "http://localhost:8080/health");
    }

    #[test]
    fn build_get_attaches_both_headers() {
        let req = client(RecordingTransport::new()).build_get("/api/v1/articles/1");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8080/api/v1/articles/1");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("authorization"), Some("Bearer test-key"));
        assert!(req.body.is_none());
    }

    #[test]
    fn build_post_sends_exact_json_encoding() {
        let mut payload = BTreeMap::new();
        payload.insert("title", "Hello");
        payload.insert("url", "https://example.com/a?b=c&d");

        let req = client(RecordingTransport::new())
            .build_post("/api/v1/articles", &payload)
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.body.as_deref(), Some(serde_json::to_string(&payload).unwrap().as_str()));
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(req.header("Authorization"), Some("Bearer test-key"));
    }

    #[test]
    fn build_post_reports_serialization_error() {
        // Maps with non-string keys cannot be encoded as JSON objects.
        let mut payload = BTreeMap::new();
        payload.insert((1, 2), "pair");

        let err = client(RecordingTransport::new())
            .build_post("/api/v1/articles", &payload)
            .unwrap_err();
        assert!(matches!(err, ApiError::SerializationError(_)));
    }

    #[test]
    fn post_does_not_send_unserializable_payload() {
        let mut payload = BTreeMap::new();
        payload.insert((1, 2), "pair");

        let client = client(RecordingTransport::new());
        let err = client.post("/api/v1/articles", &payload).unwrap_err();
        assert!(matches!(err, ApiError::SerializationError(_)));
        assert!(client.transport().requests().is_empty());
    }

    #[test]
    fn get_returns_raw_body_on_200() {
        let client = client(RecordingTransport::new().respond(200, "not even json"));
        let body = client.get("/anything").unwrap();
        assert_eq!(body, b"not even json");
    }

    #[test]
    fn non_200_statuses_carry_code_and_body() {
        for (status, body) in [
            (201, r#"{"article":{}}"#),
            (204, ""),
            (401, r#"{"error":{"message":"unauthorized","code":"UNAUTHORIZED"}}"#),
            (404, "not found"),
            (500, "<html>oops</html>"),
        ] {
            let client = client(RecordingTransport::new().respond(status, body));
            let err = client.get("/health").unwrap_err();
            match err {
                ApiError::UnexpectedStatus { status: s, body: b } => {
                    assert_eq!(s, status);
                    assert_eq!(b, body);
                }
                other => panic!("expected UnexpectedStatus for {status}, got {other:?}"),
            }
        }
    }

    #[test]
    fn transport_failure_is_wrapped() {
        let client = client(RecordingTransport::new().fail(io::ErrorKind::ConnectionRefused));
        let err = client.get("/health").unwrap_err();
        let ApiError::TransportError(source) = err else {
            panic!("expected TransportError");
        };
        let io_err = source.downcast_ref::<io::Error>().unwrap();
        assert_eq!(io_err.kind(), io::ErrorKind::ConnectionRefused);
    }

    #[test]
    fn get_health_parses_response() {
        let client = client(RecordingTransport::new().respond(
            200,
            r#"{"status":"ok","database":"connected","timestamp":"2024-01-01T00:00:00Z"}"#,
        ));
        let health = client.get_health().unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.database, "connected");
        assert_eq!(health.timestamp.to_rfc3339(), "2024-01-01T00:00:00+00:00");

        let req = client.transport().last_request();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8080/health");
        assert_eq!(req.header("Authorization"), Some("Bearer test-key"));
    }

    #[test]
    fn get_health_adds_context_to_status_error() {
        let client = client(RecordingTransport::new().respond(503, "maintenance"));
        let err = client.get_health().unwrap_err();
        assert_eq!(
            err.to_string(),
            "error retrieving health status: unexpected status code: 503, body: maintenance"
        );
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn get_health_bad_json() {
        let client = client(RecordingTransport::new().respond(200, "{"));
        let err = client.get_health().unwrap_err();
        assert!(matches!(err.root(), ApiError::DeserializationError(_)));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let rendered = format!("{:?}", client(RecordingTransport::new()));
        assert!(rendered.contains(URL));
        assert!(!rendered.contains(KEY));
    }
}
