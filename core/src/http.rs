//! HTTP transport types and the blocking transport.
//!
//! # Design
//! `HttpRequest` and `HttpResponse` describe one round trip as plain data.
//! `WebApi` builds the former and decodes the latter; the `Transport` trait
//! sits between them and is the only place that touches the network. The
//! default `UreqTransport` issues exactly one blocking request per call.
//! Tests swap in scripted transports so the whole catalog can be exercised
//! without a server.

use tracing::debug;

use crate::error::ApiError;

/// HTTP method for a request.
///
/// Payload-bearing calls are sent as `Post` with a form-encoded body, the
/// way a plain URL opener sends data; everything else is a `Get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Absolute URL including the query string.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Executes one `HttpRequest` and returns whatever the server answered.
///
/// Implementations must hand back non-200 responses as `Ok`; status
/// interpretation belongs to `WebApi::parse_response`.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
///
/// Uses ureq's default timeouts; status-code-as-error is disabled so 4xx/5xx
/// responses come back as data.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => self.agent.get(&request.url).call(),
            (HttpMethod::Post, body) => {
                let content_type = request
                    .header("content-type")
                    .unwrap_or("application/x-www-form-urlencoded");
                self.agent
                    .post(&request.url)
                    .content_type(content_type)
                    .send(body.unwrap_or_default().as_bytes())
            }
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        debug!(status, bytes = body.len(), "received response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = HttpRequest {
            method: HttpMethod::Post,
            url: "http://h/monitor/check_mk/webapi.py".into(),
            headers: vec![(
                "Content-Type".into(),
                "application/x-www-form-urlencoded".into(),
            )],
            body: Some("request={}".into()),
        };
        assert_eq!(
            req.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(req.header("accept"), None);
    }

    #[test]
    fn unreachable_server_is_a_transport_error() {
        let req = HttpRequest {
            method: HttpMethod::Get,
            url: "http://127.0.0.1:1/check_mk/webapi.py".into(),
            headers: Vec::new(),
            body: None,
        };
        let err = UreqTransport::new().execute(&req).unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
