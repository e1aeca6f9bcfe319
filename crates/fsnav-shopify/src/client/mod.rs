//! HTTP client for the Shopify Storefront GraphQL API.

mod origin;

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use fsnav_core::{AppConfig, CatalogKind, Locale};

use crate::error::StorefrontError;
use crate::retry::retry_with_backoff;
use crate::types::{global_id, GraphQlResponse, HandleData, PageData, ShopifyPage};

pub use origin::store_origin;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

const PRODUCT_HANDLE_QUERY: &str = r"query GetProductHandle($id: ID!) {
  product(id: $id) {
    handle
  }
}";

const COLLECTION_HANDLE_QUERY: &str = r"query GetCollectionHandle($id: ID!) {
  collection(id: $id) {
    handle
  }
}";

const PAGE_HANDLE_QUERY: &str = r"query GetPageHandle($id: ID!) {
  page(id: $id) {
    handle
  }
}";

const PAGE_QUERY: &str = r"query PageDetails($language: LanguageCode, $handle: String!)
@inContext(language: $language) {
  page(handle: $handle) {
    id
    title
    body
    seo {
      description
      title
    }
  }
}";

/// Client for the Shopify Storefront GraphQL API.
///
/// Transient errors (429, 5xx, network failures) are retried with
/// exponential backoff up to `max_retries` additional attempts.
#[derive(Debug, Clone)]
pub struct StorefrontClient {
    client: Client,
    endpoint: Url,
    access_token: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl StorefrontClient {
    /// Creates a client for `store_domain` (bare domain or URL) and API version.
    ///
    /// Retries are disabled; enable them with [`StorefrontClient::with_retries`].
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`StorefrontError::InvalidStoreDomain`] if the
    /// domain cannot be turned into a URL.
    pub fn new(
        store_domain: &str,
        api_version: &str,
        access_token: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, StorefrontError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let invalid = |reason: String| StorefrontError::InvalidStoreDomain {
            store_domain: store_domain.to_owned(),
            reason,
        };
        let origin = store_origin(store_domain).map_err(invalid)?;
        let endpoint = origin
            .join(&format!("api/{api_version}/graphql.json"))
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            access_token: access_token.to_owned(),
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Builds a client from the application configuration, retries included.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, StorefrontError> {
        Ok(Self::new(
            &config.store_domain,
            &config.storefront_api_version,
            &config.storefront_api_token,
            config.request_timeout_secs,
            &config.user_agent,
        )?
        .with_retries(config.max_retries, config.retry_backoff_base_ms))
    }

    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Looks up the storefront handle of a product, collection or page by its
    /// numeric id. `Ok(None)` means the resource does not exist.
    ///
    /// # Errors
    ///
    /// - [`StorefrontError::RateLimited`] after all retries are exhausted.
    /// - [`StorefrontError::UnexpectedStatus`] for any other non-2xx status.
    /// - [`StorefrontError::GraphQl`] when the response carries GraphQL errors.
    /// - [`StorefrontError::Http`] / [`StorefrontError::Deserialize`] on transport or body failures.
    pub async fn get_handle(
        &self,
        id: &str,
        kind: CatalogKind,
    ) -> Result<Option<String>, StorefrontError> {
        let query = match kind {
            CatalogKind::Product => PRODUCT_HANDLE_QUERY,
            CatalogKind::Category => COLLECTION_HANDLE_QUERY,
            CatalogKind::Content => PAGE_HANDLE_QUERY,
        };
        let variables = json!({ "id": global_id(kind, id) });
        let data: Option<HandleData> = self
            .execute(query, variables, &format!("{kind} handle (id={id})"))
            .await?;
        Ok(data.and_then(|d| d.product).map(|node| node.handle))
    }

    /// Fetches an online-store page by handle, localized via `@inContext`.
    ///
    /// `language` is a Storefront `LanguageCode` such as `DE`; see
    /// [`language_code`].
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontClient::get_handle`].
    pub async fn fetch_page_by_handle(
        &self,
        handle: &str,
        language: &str,
    ) -> Result<Option<ShopifyPage>, StorefrontError> {
        let variables = json!({ "handle": handle, "language": language });
        let data: Option<PageData> = self
            .execute(PAGE_QUERY, variables, &format!("page (handle={handle})"))
            .await?;
        Ok(data.and_then(|d| d.page))
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &'static str,
        variables: Value,
        context: &str,
    ) -> Result<Option<T>, StorefrontError> {
        let body = json!({ "query": query, "variables": variables });

        let response: GraphQlResponse<T> =
            retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
                let body = &body;
                async move {
                    let response = self
                        .client
                        .post(self.endpoint.clone())
                        .header(ACCESS_TOKEN_HEADER, &self.access_token)
                        .json(body)
                        .send()
                        .await?;
                    let status = response.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after_secs = response
                            .headers()
                            .get(reqwest::header::RETRY_AFTER)
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(1);
                        return Err(StorefrontError::RateLimited { retry_after_secs });
                    }

                    if !status.is_success() {
                        return Err(StorefrontError::UnexpectedStatus {
                            status: status.as_u16(),
                            url: self.endpoint.to_string(),
                        });
                    }

                    let text = response.text().await?;
                    serde_json::from_str::<GraphQlResponse<T>>(&text).map_err(|source| {
                        StorefrontError::Deserialize {
                            context: context.to_owned(),
                            source,
                        }
                    })
                }
            })
            .await?;

        if !response.errors.is_empty() {
            let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
            tracing::warn!(
                store = %origin::extract_domain(&self.endpoint),
                context,
                errors = ?messages,
                "storefront query returned errors"
            );
            return Err(StorefrontError::GraphQl(messages.join("; ")));
        }
        Ok(response.data)
    }
}

/// Storefront `LanguageCode` for a locale: the upper-cased language part
/// (`de-de` → `DE`).
#[must_use]
pub fn language_code(locale: &Locale) -> String {
    locale
        .commerce()
        .split('-')
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(store_domain: &str) -> StorefrontClient {
        StorefrontClient::new(store_domain, "2024-10", "token", 5, "fsnav-test/0.1")
            .expect("client construction should not fail")
    }

    #[test]
    fn endpoint_includes_api_version() {
        let client = test_client("shop.example.com");
        assert_eq!(
            client.endpoint().as_str(),
            "https://shop.example.com/api/2024-10/graphql.json"
        );
    }

    #[test]
    fn endpoint_ignores_store_path() {
        let client = test_client("https://shop.example.com/collections/all");
        assert_eq!(
            client.endpoint().as_str(),
            "https://shop.example.com/api/2024-10/graphql.json"
        );
    }

    #[test]
    fn invalid_store_domain_is_rejected() {
        let err = StorefrontClient::new("https://", "2024-10", "t", 5, "ua").unwrap_err();
        assert!(matches!(err, StorefrontError::InvalidStoreDomain { .. }));
    }

    #[test]
    fn language_code_upper_cases_language_part() {
        assert_eq!(language_code(&Locale::from_commerce("de-de")), "DE");
        assert_eq!(language_code(&Locale::from_cms("en_GB")), "EN");
    }
}
