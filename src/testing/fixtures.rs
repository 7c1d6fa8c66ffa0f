use tracing::info;

/// Values handed to every test before it runs.
#[derive(Debug, Clone)]
pub struct Fixtures {
    base_url: String,
}

impl Fixtures {
    pub fn new(base_url: &str) -> Self {
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL of the service under test, always ending in `/`.
    pub fn api_url(&self, test_name: &str) -> String {
        info!("initializing fixture api_url for test: {test_name}");
        self.base_url.clone()
    }
}
