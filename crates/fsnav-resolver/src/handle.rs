//! Handle lookups through the `/getHandleById` proxy endpoint.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use fsnav_core::CatalogKind;

use crate::source::HandleSource;

#[derive(Debug, Deserialize)]
struct HandleBody {
    handle: Option<String>,
    error: Option<String>,
}

/// Client for a remote `/getHandleById` endpoint.
///
/// Every failure (transport, non-2xx, malformed body) is logged and turned
/// into `None`.
#[derive(Debug, Clone)]
pub struct ProxyHandleClient {
    client: Client,
    base_url: String,
}

impl ProxyHandleClient {
    /// # Errors
    ///
    /// Returns the `reqwest` builder error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn get_handle(&self, id: &str, kind: CatalogKind) -> Option<String> {
        let mut url = match Url::parse(&format!("{}/getHandleById", self.base_url)) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(base_url = %self.base_url, error = %e, "invalid handle proxy URL");
                return None;
            }
        };
        url.query_pairs_mut()
            .append_pair("id", id)
            .append_pair("type", kind.as_str());

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(id, %kind, error = %e, "failed to fetch handle");
                return None;
            }
        };
        let status = response.status();
        let body = match response.json::<HandleBody>().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(id, %kind, %status, error = %e, "malformed handle response");
                return None;
            }
        };
        if !status.is_success() {
            tracing::warn!(
                id,
                %kind,
                %status,
                error = body.error.as_deref().unwrap_or("unknown error"),
                "error fetching handle"
            );
            return None;
        }
        body.handle
    }
}

impl HandleSource for ProxyHandleClient {
    fn lookup_handle(
        &self,
        id: &str,
        kind: CatalogKind,
    ) -> impl Future<Output = Option<String>> + Send {
        self.get_handle(id, kind)
    }
}
