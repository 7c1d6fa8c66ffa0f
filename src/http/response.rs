use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    /// Header names are stored lower-cased.
    pub headers: HashMap<String, String>,
    pub body: String,
    pub size_bytes: usize,
    pub elapsed: Duration,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn content_type(&self) -> &str {
        self.header("content-type").unwrap_or("")
    }

    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

#[cfg(test)]
pub(crate) fn sample_response(status: u16, content_type: &str, body: &str) -> HttpResponse {
    let mut headers = HashMap::new();
    if !content_type.is_empty() {
        headers.insert("content-type".to_string(), content_type.to_string());
    }
    HttpResponse {
        status,
        status_text: String::new(),
        headers,
        body: body.to_string(),
        size_bytes: body.len(),
        elapsed: Duration::from_millis(5),
    }
}
