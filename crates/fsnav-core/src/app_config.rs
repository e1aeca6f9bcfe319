use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Base URL of the CMS frontend-API backend (`fetchNavigation`, `findPage`, `findElement`).
    pub ecom_api_url: String,
    /// Default CMS locale, e.g. `en_GB`.
    pub ecom_api_locale: String,
    pub store_domain: String,
    pub storefront_api_token: String,
    pub storefront_api_version: String,
    /// Base URL of a remote `/getHandleById` proxy. `None` means "talk to the
    /// Storefront API directly".
    pub handle_proxy_url: Option<String>,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub preview: bool,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub poll_max_tries: u32,
    pub poll_base_delay_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("ecom_api_url", &self.ecom_api_url)
            .field("ecom_api_locale", &self.ecom_api_locale)
            .field("store_domain", &self.store_domain)
            .field("storefront_api_token", &"[redacted]")
            .field("storefront_api_version", &self.storefront_api_version)
            .field("handle_proxy_url", &self.handle_proxy_url)
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("preview", &self.preview)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("poll_max_tries", &self.poll_max_tries)
            .field("poll_base_delay_ms", &self.poll_base_delay_ms)
            .finish()
    }
}
