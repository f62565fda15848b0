//! Client configuration

/// Configuration for connecting to the checker backend.
///
/// # Environment variables
///
/// | Variable | Default | Purpose |
/// |----------|---------|---------|
/// | ADMIN_API_BASE_URL | http://localhost:4000 | Admin backend |
/// | PUBLIC_API_BASE_URL | http://localhost:4000 | Customer backend |
/// | ADMIN_API_KEY | (none) | Static API key header |
/// | REQUEST_TIMEOUT_SECS | 30 | Per-request abort timeout |
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Admin backend base URL
    pub admin_base_url: String,
    /// Public / customer backend base URL
    pub public_base_url: String,
    /// Static API key attached to admin calls
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout: u64,
}

impl ClientConfig {
    /// Create a configuration with both surfaces on one base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            admin_base_url: base_url.clone(),
            public_base_url: base_url,
            api_key: None,
            timeout: 30,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let admin = std::env::var("ADMIN_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:4000".into());
        let public =
            std::env::var("PUBLIC_API_BASE_URL").unwrap_or_else(|_| admin.clone());
        Self {
            admin_base_url: admin,
            public_base_url: public,
            api_key: std::env::var("ADMIN_API_KEY").ok(),
            timeout: std::env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }

    /// Set the admin base URL
    pub fn with_admin_base_url(mut self, url: impl Into<String>) -> Self {
        self.admin_base_url = url.into();
        self
    }

    /// Set the public base URL
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = url.into();
        self
    }

    /// Set the static API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:4000")
    }
}
