use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::error::HttpError;
use crate::history::{History, HistoryEntry};
use crate::http::{ApiClient, HttpResponse, RequestInput};

use super::hooks::ScreenCapture;
use super::soft::SoftAssert;

/// Everything one test body may touch while it runs.
pub struct TestContext {
    name: String,
    nodeid: String,
    api_url: String,
    client: ApiClient,
    reports_dir: PathBuf,
    driver: Option<Arc<dyn ScreenCapture>>,
    history: History,
    pub check: SoftAssert,
}

impl TestContext {
    pub fn new(
        name: impl Into<String>,
        nodeid: impl Into<String>,
        api_url: impl Into<String>,
        client: ApiClient,
        reports_dir: impl Into<PathBuf>,
        driver: Option<Arc<dyn ScreenCapture>>,
    ) -> Self {
        Self {
            name: name.into(),
            nodeid: nodeid.into(),
            api_url: api_url.into(),
            client,
            reports_dir: reports_dir.into(),
            driver,
            history: History::new(),
            check: SoftAssert::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `api_url` joined with a relative resource path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path.trim_start_matches('/'))
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    pub fn driver(&self) -> Option<&Arc<dyn ScreenCapture>> {
        self.driver.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub async fn send(&mut self, request: RequestInput) -> Result<HttpResponse, HttpError> {
        let timestamp = Utc::now();
        let method = request.method;
        let url = request.url.clone();

        debug!(test = %self.nodeid, "{method} {url}");
        let result = self.client.send(request).await;
        let (status, duration_ms, size_bytes) = match &result {
            Ok(response) => {
                debug!(
                    test = %self.nodeid,
                    "{method} {url} -> {} {}",
                    response.status,
                    response.status_text
                );
                (
                    Some(response.status),
                    Some(response.elapsed.as_millis()),
                    Some(response.size_bytes),
                )
            }
            Err(err) => {
                debug!(test = %self.nodeid, "{method} {url} failed: {err}");
                (None, None, None)
            }
        };
        self.history.push(HistoryEntry {
            timestamp,
            method,
            url,
            status,
            duration_ms,
            size_bytes,
        });

        result
    }

    pub async fn get(&mut self, path: &str) -> Result<HttpResponse, HttpError> {
        let url = self.endpoint(path);
        self.send(RequestInput::get(url)).await
    }

    pub async fn post_form(
        &mut self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> Result<HttpResponse, HttpError> {
        let url = self.endpoint(path);
        self.send(RequestInput::post_form(url, fields)).await
    }

    pub async fn patch_form(
        &mut self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> Result<HttpResponse, HttpError> {
        let url = self.endpoint(path);
        self.send(RequestInput::patch_form(url, fields)).await
    }

    pub async fn delete(&mut self, path: &str) -> Result<HttpResponse, HttpError> {
        let url = self.endpoint(path);
        self.send(RequestInput::delete(url)).await
    }
}
