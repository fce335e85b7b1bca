//! Verify `build_request` and `parse_response` against the JSON test vectors
//! stored in `test-vectors/`.
//!
//! Request vectors pin the exact query string and form body, since the wire
//! encoding (percent-escaping, separators, key order) is what the server
//! sees. Response vectors feed a simulated body through the envelope decoder.

use cmk_core::{ApiCall, ApiError, Format, HttpMethod, HttpResponse, Params, WebApi};
use serde_json::Value;

const SITE_URL: &str = "http://localhost:5000/mysite";

fn client() -> WebApi {
    WebApi::new(SITE_URL, "automation", "secret")
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

fn parse_format(case: &Value, key: &str) -> Format {
    case.get(key)
        .and_then(Value::as_str)
        .map(|s| s.parse().unwrap())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/request.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let endpoint = vectors["endpoint"].as_str().unwrap();

    let c = client();
    assert_eq!(c.endpoint(), endpoint);

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let mut call = ApiCall::new(case["action"].as_str().unwrap());
        for (key, value) in case["query"].as_object().unwrap() {
            call = call.query(key.clone(), value.clone());
        }
        if let Value::Object(data) = &case["data"] {
            call = call.data(Params::clone(data));
        }
        let request_format = parse_format(case, "request_format");
        if request_format != Format::Json {
            call = call.request_format(request_format);
        }
        let output_format = parse_format(case, "output_format");
        if output_format != Format::Json {
            call = call.output_format_as(output_format);
        }

        let expected = &case["expected_request"];
        let req = c.build_request(&call).unwrap();
        assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(
            req.url,
            format!("{endpoint}?{}", expected["query"].as_str().unwrap()),
            "{name}: url"
        );
        assert_eq!(req.body.as_deref(), expected["body"].as_str(), "{name}: body");
        match req.method {
            HttpMethod::Post => assert_eq!(
                req.header("content-type"),
                Some("application/x-www-form-urlencoded"),
                "{name}: content-type"
            ),
            HttpMethod::Get => assert!(req.headers.is_empty(), "{name}: headers"),
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/response.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let sim = &case["simulated_response"];
        let response = HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: sim["body"].as_str().unwrap().to_string(),
        };
        let result = c.parse_response(response, parse_format(case, "output_format"));

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error["kind"].as_str().unwrap() {
                "Response" => match err {
                    ApiError::Response { status, .. } => {
                        assert_eq!(u64::from(status), expected_error["status"].as_u64().unwrap(), "{name}: status")
                    }
                    other => panic!("{name}: expected Response, got {other:?}"),
                },
                "Authentication" => {
                    assert!(matches!(err, ApiError::Authentication(_)), "{name}: expected Authentication")
                }
                "MalformedResponse" => {
                    assert!(matches!(err, ApiError::MalformedResponse { .. }), "{name}: expected MalformedResponse")
                }
                "Result" => match err {
                    ApiError::Result { code, body } => {
                        assert_eq!(code, expected_error["code"].as_i64().unwrap(), "{name}: code");
                        assert_eq!(body, expected_error["body"], "{name}: body");
                    }
                    other => panic!("{name}: expected Result, got {other:?}"),
                },
                other => panic!("{name}: unknown expected_error: {other}"),
            }
        } else {
            assert_eq!(result.unwrap(), case["expected_result"], "{name}: parsed result");
        }
    }
}
