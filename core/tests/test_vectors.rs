//! Verify `Gateway::prepare` and `classify` against the JSON vectors in
//! `test-vectors/`.
//!
//! Each case describes caller options, the request the gateway must build,
//! a simulated response, and either the decoded result or the error it must
//! produce. Payloads are compared as parsed JSON so key order does not matter.

use async_trait::async_trait;
use catalog_core::{
    classify, ApiError, ClientConfig, CredentialsMode, Gateway, HttpMethod, HttpRequest,
    HttpResponse, RequestOptions, Transport,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:8000/api";

/// Never called; `prepare` does no I/O.
struct NoTransport;

#[async_trait]
impl Transport for NoTransport {
    async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, ApiError> {
        unreachable!("vectors only exercise prepare and classify")
    }
}

fn gateway() -> Gateway<NoTransport> {
    Gateway::with_transport(&ClientConfig::new(BASE_URL).unwrap(), NoTransport)
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn parse_headers(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

fn parse_options(value: &Value) -> RequestOptions {
    RequestOptions {
        method: parse_method(value["method"].as_str().unwrap()),
        headers: parse_headers(&value["headers"]),
        body: value["body"].as_str().map(str::to_string),
    }
}

#[test]
fn gateway_test_vectors() {
    let raw = include_str!("../../test-vectors/gateway.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let gw = gateway();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let expected_req = &case["expected_request"];

        // Verify prepare
        let req = gw
            .prepare(case["path"].as_str().unwrap(), parse_options(&case["options"]))
            .unwrap();
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected_req["url"].as_str().unwrap()), "{name}: url");
        assert_eq!(req.headers, parse_headers(&expected_req["headers"]), "{name}: headers");
        assert_eq!(req.body.as_deref(), expected_req["body"].as_str(), "{name}: body");
        assert_eq!(req.credentials, CredentialsMode::Include, "{name}: credentials");

        // Verify classify
        let sim = &case["simulated_response"];
        let response = HttpResponse::new(
            sim["status"].as_u64().unwrap() as u16,
            sim["body"].as_str().unwrap(),
        );
        let result = classify::<Value>(&response);

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error["kind"].as_str().unwrap() {
                "Application" => match err {
                    ApiError::Application { status, message } => {
                        assert_eq!(u64::from(status), expected_error["status"].as_u64().unwrap(), "{name}: status");
                        assert_eq!(message, expected_error["message"].as_str().unwrap(), "{name}: message");
                    }
                    other => panic!("{name}: expected Application, got {other:?}"),
                },
                "Decode" => assert!(matches!(err, ApiError::Decode(_)), "{name}: expected Decode"),
                other => panic!("{name}: unknown expected_error kind: {other}"),
            }
        } else {
            assert_eq!(result.unwrap(), case["expected_result"], "{name}: parsed result");
        }
    }
}
