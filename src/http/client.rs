use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::error::HttpError;

use super::request::{RequestBody, RequestInput};
use super::response::HttpResponse;

/// Shared HTTP client for a whole run. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: reqwest::Client,
    default_headers: HeaderMap,
}

impl ApiClient {
    pub fn new(timeout: Duration, default_headers: &[(String, String)]) -> Result<Self, HttpError> {
        let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::limited(10));
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }
        let inner = builder.build().map_err(HttpError::ClientBuild)?;

        Ok(Self {
            inner,
            default_headers: build_headers(default_headers)?,
        })
    }

    pub async fn send(&self, request: RequestInput) -> Result<HttpResponse, HttpError> {
        let url = reqwest::Url::parse(&request.url).map_err(|e| HttpError::InvalidUrl {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;

        let mut req_builder = self
            .inner
            .request(request.method.into(), url)
            .headers(self.default_headers.clone());

        if request.method.allows_body() {
            req_builder = match &request.body {
                RequestBody::Empty => req_builder,
                RequestBody::Form(fields) => req_builder.form(fields),
            };
        }

        debug!(method = %request.method, url = %request.url, "sending request");
        let started = Instant::now();
        let response = req_builder.send().await.map_err(HttpError::Transport)?;
        let elapsed = started.elapsed();

        let status = response.status();
        let headers = collect_headers(response.headers());
        let bytes = response.bytes().await.map_err(HttpError::Body)?;
        let size_bytes = bytes.len();
        let body = String::from_utf8_lossy(&bytes).into_owned();

        debug!(
            status = status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            size_bytes,
            "received response"
        );

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            headers,
            body,
            size_bytes,
            elapsed,
        })
    }
}

fn collect_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut collected = HashMap::new();
    for (name, value) in headers {
        let value = value.to_str().unwrap_or("<binary>");
        collected
            .entry(name.as_str().to_ascii_lowercase())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    collected
}

fn build_headers(input: &[(String, String)]) -> Result<HeaderMap, HttpError> {
    let mut headers = HeaderMap::new();

    for (key, value) in input {
        let header_name = HeaderName::from_bytes(key.trim().as_bytes())
            .map_err(|e| HttpError::InvalidHeader(format!("{key}: {e}")))?;
        let header_value = HeaderValue::from_str(value.trim())
            .map_err(|e| HttpError::InvalidHeader(format!("{key}: {e}")))?;
        headers.append(header_name, header_value);
    }

    Ok(headers)
}

/// Parse a `Name: value` header line as given on the command line.
pub fn parse_header_line(line: &str) -> Result<(String, String), HttpError> {
    let raw = line.trim();
    let (key, value) = raw
        .split_once(':')
        .ok_or_else(|| HttpError::InvalidHeader(format!("missing `:` in `{raw}`")))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(HttpError::InvalidHeader(format!("empty name in `{raw}`")));
    }
    HeaderName::from_bytes(key.as_bytes())
        .map_err(|e| HttpError::InvalidHeader(format!("{key}: {e}")))?;

    Ok((key.to_string(), value.trim().to_string()))
}
