//! HTTP client for the CMS frontend API backend.
//!
//! The backend exposes three read endpoints used by the storefront:
//! `fetchNavigation`, `findPage` and `findElement`. All take their arguments
//! as query parameters and answer with JSON. A `404` from the page endpoints
//! means "no such page" and is surfaced as `Ok(None)`.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use fsnav_core::{NavigationTree, PagePayload, PageTarget};

use crate::error::CaasError;

const DEFAULT_USER_AGENT: &str = "fsnav/0.1 (storefront-navigation)";

/// Client for the CMS frontend API backend.
///
/// Use [`FrontendApiClient::new`] with the configured `ECOM_API_URL`; tests
/// point it at a wiremock server the same way.
#[derive(Debug, Clone)]
pub struct FrontendApiClient {
    client: Client,
    base_url: Url,
}

impl FrontendApiClient {
    /// Creates a client with the default user agent.
    ///
    /// # Errors
    ///
    /// Returns [`CaasError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`CaasError::InvalidBaseUrl`] if `base_url` is not a
    /// valid URL.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, CaasError> {
        Self::with_user_agent(base_url, timeout_secs, DEFAULT_USER_AGENT)
    }

    /// Creates a client with an explicit user agent.
    ///
    /// # Errors
    ///
    /// Same as [`FrontendApiClient::new`].
    pub fn with_user_agent(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, CaasError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Keep exactly one trailing slash so `join` appends the endpoint name
        // instead of replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| CaasError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    /// Fetches the full navigation tree for a CMS locale (`de_DE`).
    ///
    /// # Errors
    ///
    /// - [`CaasError::Http`] on network failure or any non-2xx status.
    /// - [`CaasError::Deserialize`] if the body is not a navigation tree.
    pub async fn fetch_navigation(
        &self,
        initial_path: &str,
        cms_locale: &str,
    ) -> Result<NavigationTree, CaasError> {
        let url = self.build_url(
            "fetchNavigation",
            &[("initialPath", initial_path), ("locale", cms_locale)],
        );
        tracing::debug!(%url, "fetching navigation");
        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        decode(&body, format!("fetchNavigation(locale={cms_locale})"))
    }

    /// Fetches a commerce-anchored page by its commerce id and type.
    ///
    /// # Errors
    ///
    /// - [`CaasError::Http`] on network failure or a non-2xx status other than 404.
    /// - [`CaasError::Deserialize`] if the body is not a page payload.
    pub async fn find_page(&self, target: &PageTarget) -> Result<Option<PagePayload>, CaasError> {
        let id = target.id.as_deref().unwrap_or_default();
        let url = self.build_url(
            "findPage",
            &[
                ("id", id),
                ("locale", &target.locale),
                ("type", &target.page_type),
            ],
        );
        self.request_optional(&url, format!("findPage(id={id})"))
            .await
    }

    /// Fetches a CMS-driven page by its CaaS document id.
    ///
    /// # Errors
    ///
    /// - [`CaasError::Http`] on network failure or a non-2xx status other than 404.
    /// - [`CaasError::Deserialize`] if the body is not a page payload.
    pub async fn find_element(
        &self,
        fs_page_id: &str,
        cms_locale: &str,
    ) -> Result<Option<PagePayload>, CaasError> {
        let url = self.build_url(
            "findElement",
            &[("fsPageId", fs_page_id), ("locale", cms_locale)],
        );
        self.request_optional(&url, format!("findElement(fsPageId={fs_page_id})"))
            .await
    }

    fn build_url(&self, endpoint: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(endpoint);
        }
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    /// GETs `url`, mapping `404` and an empty/`null` body to `None`.
    async fn request_optional<T: DeserializeOwned>(
        &self,
        url: &Url,
        context: String,
    ) -> Result<Option<T>, CaasError> {
        tracing::debug!(%url, "fetching page");
        let response = self.client.get(url.clone()).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status()?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        decode(&body, context)
    }
}

fn decode<T: DeserializeOwned>(body: &str, context: String) -> Result<T, CaasError> {
    serde_json::from_str(body).map_err(|source| CaasError::Deserialize { context, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> FrontendApiClient {
        FrontendApiClient::new(base_url, 30).expect("client construction should not fail")
    }

    #[test]
    fn build_url_appends_endpoint_to_base_path() {
        let client = test_client("https://cms.example.com/api");
        let url = client.build_url("fetchNavigation", &[("initialPath", "/"), ("locale", "de_DE")]);
        assert_eq!(
            url.as_str(),
            "https://cms.example.com/api/fetchNavigation?initialPath=%2F&locale=de_DE"
        );
    }

    #[test]
    fn build_url_strips_trailing_slash() {
        let client = test_client("https://cms.example.com/api/");
        let url = client.build_url("findElement", &[("fsPageId", "abc")]);
        assert_eq!(
            url.as_str(),
            "https://cms.example.com/api/findElement?fsPageId=abc"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = FrontendApiClient::new("not a url", 30).unwrap_err();
        assert!(matches!(err, CaasError::InvalidBaseUrl { .. }));
    }
}
