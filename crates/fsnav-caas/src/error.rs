use thiserror::Error;

/// Errors returned by the CMS frontend API client.
#[derive(Debug, Error)]
pub enum CaasError {
    /// Network or TLS failure, or a non-2xx status other than 404.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured base URL could not be parsed.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
