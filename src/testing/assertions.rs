//! Hard assertions over HTTP responses.
//!
//! `validate_api_response` runs the five checks every contract test relies
//! on: status, content type, required fields, and latency. The first failed
//! check aborts.

use std::collections::BTreeSet;
use std::fmt::{self, Display};
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::http::HttpResponse;

/// Part of the response an assertion looked at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum AssertionTarget {
    StatusCode,
    Header(String),
    JsonField(String),
    Body,
    Latency,
    Condition,
}

impl Display for AssertionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssertionTarget::StatusCode => write!(f, "status"),
            AssertionTarget::Header(name) => write!(f, "header `{name}`"),
            AssertionTarget::JsonField(name) => write!(f, "field `{name}`"),
            AssertionTarget::Body => write!(f, "body"),
            AssertionTarget::Latency => write!(f, "latency"),
            AssertionTarget::Condition => write!(f, "condition"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{target}: {message} (expected {expected}, got {actual})")]
pub struct AssertionFailure {
    pub target: AssertionTarget,
    pub expected: String,
    pub actual: String,
    pub message: String,
}

impl AssertionFailure {
    pub fn new(
        target: AssertionTarget,
        expected: impl Into<String>,
        actual: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            target,
            expected: expected.into(),
            actual: actual.into(),
            message: message.into(),
        }
    }
}

/// What a response must look like to pass `validate_api_response`.
#[derive(Debug, Clone)]
pub struct ResponseExpectation {
    pub status: u16,
    pub fields: Vec<String>,
    pub max_time: Duration,
}

impl ResponseExpectation {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            fields: Vec::new(),
            max_time: Duration::from_secs(1),
        }
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn within(mut self, max_time: Duration) -> Self {
        self.max_time = max_time;
        self
    }
}

/// Returns the parsed body, or an empty object when there is no body.
pub fn validate_api_response(
    response: &HttpResponse,
    expectation: &ResponseExpectation,
) -> Result<Value, AssertionFailure> {
    if response.status != expectation.status {
        return Err(AssertionFailure::new(
            AssertionTarget::StatusCode,
            expectation.status.to_string(),
            response.status.to_string(),
            "unexpected status code",
        ));
    }

    // 204 No Content may legitimately omit the content type.
    if expectation.status != 204 && !response.content_type().contains("application/json") {
        return Err(AssertionFailure::new(
            AssertionTarget::Header("content-type".to_string()),
            "application/json",
            response.content_type(),
            "response is not JSON",
        ));
    }

    let body = if response.has_body() {
        Some(response.json().map_err(|e| {
            AssertionFailure::new(AssertionTarget::Body, "valid JSON", e.to_string(), "body does not parse")
        })?)
    } else {
        None
    };

    if !expectation.fields.is_empty() {
        if let Some(body) = &body {
            let object = body.as_object().ok_or_else(|| {
                AssertionFailure::new(
                    AssertionTarget::Body,
                    "JSON object",
                    json_kind(body),
                    "cannot check fields on a non-object body",
                )
            })?;
            let keys: BTreeSet<&str> = object.keys().map(String::as_str).collect();
            if let Some(missing) = expectation.fields.iter().find(|f| !keys.contains(f.as_str())) {
                return Err(AssertionFailure::new(
                    AssertionTarget::JsonField(missing.clone()),
                    format!("{:?}", expectation.fields),
                    format!("{keys:?}"),
                    "required field missing",
                ));
            }
        }
    }

    if response.elapsed >= expectation.max_time {
        return Err(AssertionFailure::new(
            AssertionTarget::Latency,
            format!("< {:.3}s", expectation.max_time.as_secs_f64()),
            format!("{:.3}s", response.elapsed.as_secs_f64()),
            "response too slow",
        ));
    }

    Ok(body.unwrap_or_else(|| Value::Object(Map::new())))
}

pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), AssertionFailure> {
    if condition {
        Ok(())
    } else {
        Err(AssertionFailure::new(
            AssertionTarget::Condition,
            "true",
            "false",
            message,
        ))
    }
}

pub fn ensure_status_in(response: &HttpResponse, allowed: &[u16]) -> Result<(), AssertionFailure> {
    if allowed.contains(&response.status) {
        Ok(())
    } else {
        Err(AssertionFailure::new(
            AssertionTarget::StatusCode,
            format!("one of {allowed:?}"),
            response.status.to_string(),
            "unexpected status code",
        ))
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::sample_response;

    #[test]
    fn passes_and_returns_body() {
        let resp = sample_response(200, "application/json; charset=utf-8", r#"{"id": 1, "name": "Leanne"}"#);
        let body = validate_api_response(
            &resp,
            &ResponseExpectation::status(200).fields(["id", "name"]),
        )
        .unwrap();
        assert_eq!(body["name"], "Leanne");
    }

    #[test]
    fn status_mismatch_fails_first() {
        let resp = sample_response(404, "text/html", "");
        let err = validate_api_response(&resp, &ResponseExpectation::status(200)).unwrap_err();
        assert_eq!(err.target, AssertionTarget::StatusCode);
        assert_eq!(err.expected, "200");
        assert_eq!(err.actual, "404");
    }

    #[test]
    fn non_json_content_type_fails() {
        let resp = sample_response(200, "text/plain", "hello");
        let err = validate_api_response(&resp, &ResponseExpectation::status(200)).unwrap_err();
        assert_eq!(err.target, AssertionTarget::Header("content-type".into()));
    }

    #[test]
    fn no_content_skips_header_check_and_yields_empty_object() {
        let resp = sample_response(204, "", "");
        let body = validate_api_response(
            &resp,
            &ResponseExpectation::status(204).fields(["id"]),
        )
        .unwrap();
        assert_eq!(body, Value::Object(Map::new()));
    }

    #[test]
    fn missing_field_is_reported() {
        let resp = sample_response(201, "application/json", r#"{"name": "x"}"#);
        let err = validate_api_response(
            &resp,
            &ResponseExpectation::status(201).fields(["name", "id"]),
        )
        .unwrap_err();
        assert_eq!(err.target, AssertionTarget::JsonField("id".into()));
    }

    #[test]
    fn fields_on_array_body_fail() {
        let resp = sample_response(200, "application/json", "[]");
        let err = validate_api_response(
            &resp,
            &ResponseExpectation::status(200).fields(["id"]),
        )
        .unwrap_err();
        assert_eq!(err.target, AssertionTarget::Body);
        assert_eq!(err.actual, "array");
    }

    #[test]
    fn empty_field_list_accepts_array_body() {
        let resp = sample_response(200, "application/json", "[1, 2]");
        let body = validate_api_response(&resp, &ResponseExpectation::status(200)).unwrap();
        assert_eq!(body.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn latency_bound_is_strict() {
        let mut resp = sample_response(200, "application/json", "{}");
        resp.elapsed = Duration::from_secs(2);
        let err = validate_api_response(
            &resp,
            &ResponseExpectation::status(200).within(Duration::from_secs(2)),
        )
        .unwrap_err();
        assert_eq!(err.target, AssertionTarget::Latency);
    }

    #[test]
    fn ensure_status_in_accepts_listed_codes() {
        let resp = sample_response(404, "application/json", "{}");
        assert!(ensure_status_in(&resp, &[200, 404]).is_ok());
        let err = ensure_status_in(&resp, &[200, 204]).unwrap_err();
        assert_eq!(err.expected, "one of [200, 204]");
    }

    #[test]
    fn ensure_carries_message() {
        let err = ensure(false, "id must be present").unwrap_err();
        assert_eq!(err.message, "id must be present");
        assert!(ensure(true, "unused").is_ok());
    }
}
