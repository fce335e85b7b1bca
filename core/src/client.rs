//! Request builder and response decoder for the Check_MK web API.
//!
//! # Design
//! `WebApi` holds the resolved endpoint, the automation credentials and a
//! transport, and never changes after construction. Every remote action is
//! described by an `ApiCall`; `build_request` turns it into an `HttpRequest`
//! and `parse_response` turns the matching `HttpResponse` into the envelope's
//! `result` value. Both halves are pure, so they are tested without a server.
//! `call` is the only method that runs the transport, and it runs it exactly
//! once.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use tracing::debug;
use url::form_urlencoded;

use crate::endpoint::resolve_endpoint;
use crate::error::ApiError;
use crate::format::Format;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::params::{shape, Params};

const AUTH_ERROR_PREFIX: &str = "Authentication error:";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Characters escaped in the request body. Everything but alphanumerics,
/// `_.-~` and `{}[]"=,: ` so the payload stays readable on the wire.
const BODY_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'{')
    .remove(b'[')
    .remove(b']')
    .remove(b'}')
    .remove(b'"')
    .remove(b'=')
    .remove(b',')
    .remove(b' ')
    .remove(b':');

/// One remote action: name, query parameters, payload and formats.
#[derive(Debug, Clone)]
pub struct ApiCall {
    action: String,
    query: Params,
    data: Option<Params>,
    request_format: Format,
    output_format: Format,
}

impl ApiCall {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            query: Params::new(),
            data: None,
            request_format: Format::Json,
            output_format: Format::Json,
        }
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn output_format(&self) -> Format {
        self.output_format
    }

    /// Add a query parameter. `Value::Null` is dropped during shaping.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Set the request payload. An empty mapping sends no body.
    pub fn data(mut self, data: Params) -> Self {
        self.data = Some(data);
        self
    }

    /// Encode the payload with `format`, telling the server via
    /// `request_format` when it is not the JSON default.
    pub fn request_format(mut self, format: Format) -> Self {
        self.request_format = format;
        if format != Format::Json {
            self.query.insert("request_format".into(), format.as_str().into());
        }
        self
    }

    /// Ask the server to answer in `format`, via `output_format` when it is
    /// not the JSON default.
    pub fn output_format_as(mut self, format: Format) -> Self {
        self.output_format = format;
        if format != Format::Json {
            self.query.insert("output_format".into(), format.as_str().into());
        }
        self
    }
}

/// Synchronous, stateless client for the Check_MK web API.
///
/// ```no_run
/// use cmk_core::WebApi;
///
/// let api = WebApi::new("http://checkmk.example.com/monitor", "automation", "secret");
/// let hosts = api.get_all_hosts(false)?;
/// # Ok::<(), cmk_core::ApiError>(())
/// ```
#[derive(Debug, Clone)]
pub struct WebApi<T = UreqTransport> {
    endpoint: String,
    username: String,
    secret: String,
    transport: T,
}

impl WebApi<UreqTransport> {
    /// `url` may be the site root, the `check_mk` directory or the full
    /// `webapi.py` URL.
    pub fn new(url: &str, username: &str, secret: &str) -> Self {
        Self::with_transport(url, username, secret, UreqTransport::new())
    }
}

impl<T: Transport> WebApi<T> {
    pub fn with_transport(url: &str, username: &str, secret: &str, transport: T) -> Self {
        Self {
            endpoint: resolve_endpoint(url),
            username: username.to_string(),
            secret: secret.to_string(),
            transport,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run `call` against the server and return the envelope's `result`.
    pub fn call(&self, call: ApiCall) -> Result<Value, ApiError> {
        let request = self.build_request(&call)?;
        debug!(
            action = call.action(),
            method = ?request.method,
            endpoint = %self.endpoint,
            "sending request"
        );
        let response = self.transport.execute(&request)?;
        debug!(action = call.action(), status = response.status, "received response");
        self.parse_response(response, call.output_format())
    }

    /// Like `call`, with the action and optional parts spelled out.
    pub fn make_request(
        &self,
        action: &str,
        query: Option<Params>,
        data: Option<Params>,
    ) -> Result<Value, ApiError> {
        let mut call = ApiCall::new(action);
        for (key, value) in query.unwrap_or_default() {
            let format = value.as_str().and_then(|s| s.parse::<Format>().ok());
            call = match format {
                Some(format) if key == "request_format" => call.request_format(format),
                Some(format) if key == "output_format" => call.output_format_as(format),
                _ => call,
            }
            .query(key, value);
        }
        if let Some(data) = data {
            call = call.data(data);
        }
        self.call(call)
    }

    pub fn build_request(&self, call: &ApiCall) -> Result<HttpRequest, ApiError> {
        let url = format!("{}?{}", self.endpoint, self.build_query(call));
        match self.build_body(call)? {
            Some(body) => Ok(HttpRequest {
                method: HttpMethod::Post,
                url,
                headers: vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())],
                body: Some(body),
            }),
            None => Ok(HttpRequest {
                method: HttpMethod::Get,
                url,
                headers: Vec::new(),
                body: None,
            }),
        }
    }

    fn build_query(&self, call: &ApiCall) -> String {
        let mut params = Params::new();
        params.insert("_username".into(), self.username.clone().into());
        params.insert("_secret".into(), self.secret.clone().into());
        for (key, value) in &call.query {
            params.insert(key.clone(), value.clone());
        }
        params.insert("action".into(), call.action.clone().into());

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in shape(&params) {
            match value {
                Value::String(s) => serializer.append_pair(&key, &s),
                other => serializer.append_pair(&key, &other.to_string()),
            };
        }
        serializer.finish()
    }

    fn build_body(&self, call: &ApiCall) -> Result<Option<String>, ApiError> {
        let Some(data) = call.data.as_ref().filter(|d| !d.is_empty()) else {
            return Ok(None);
        };
        let encoded = call
            .request_format
            .codec()
            .encode(&Value::Object(shape(data)))
            .map_err(ApiError::Encode)?;
        let body = format!("request={encoded}");
        Ok(Some(utf8_percent_encode(&body, BODY_ESCAPES).to_string()))
    }

    /// Status check, authentication marker, envelope decoding and result
    /// code check, in that order.
    pub fn parse_response(
        &self,
        response: HttpResponse,
        output_format: Format,
    ) -> Result<Value, ApiError> {
        if response.status != 200 {
            return Err(ApiError::Response {
                status: response.status,
                body: response.body,
            });
        }
        if response.body.starts_with(AUTH_ERROR_PREFIX) {
            return Err(ApiError::Authentication(response.body));
        }

        let decoded = output_format
            .codec()
            .decode(&response.body)
            .map_err(|e| ApiError::malformed(&response.body, e))?;
        let Value::Object(mut envelope) = decoded else {
            return Err(ApiError::malformed(&response.body, "body is not a mapping"));
        };
        let (Some(result), Some(code)) = (envelope.remove("result"), envelope.remove("result_code"))
        else {
            return Err(ApiError::malformed(
                &response.body,
                "missing result or result_code",
            ));
        };
        match code.as_i64() {
            Some(0) => Ok(result),
            Some(code) => Err(ApiError::Result { code, body: result }),
            None => Err(ApiError::malformed(
                &response.body,
                "result_code is not an integer",
            )),
        }
    }
}
