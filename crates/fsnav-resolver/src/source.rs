//! Upstream seams: where navigation trees, page payloads and handles come from.
//!
//! The production implementations are the CMS frontend API client and the
//! Storefront API client; tests plug in in-memory fakes.

use std::future::Future;

use fsnav_caas::{CaasError, FrontendApiClient};
use fsnav_core::{CatalogKind, NavigationTree, PagePayload, PageTarget};
use fsnav_shopify::StorefrontClient;

pub trait NavigationSource: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches the whole navigation tree for a CMS locale.
    fn fetch_tree(
        &self,
        cms_locale: &str,
    ) -> impl Future<Output = Result<NavigationTree, Self::Error>> + Send;
}

pub trait PageSource: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Commerce-anchored page lookup. `Ok(None)` when the page does not exist.
    fn fetch_page(
        &self,
        target: &PageTarget,
    ) -> impl Future<Output = Result<Option<PagePayload>, Self::Error>> + Send;

    /// CMS-driven page lookup by CaaS document id.
    fn fetch_element(
        &self,
        caas_document_id: &str,
        cms_locale: &str,
    ) -> impl Future<Output = Result<Option<PagePayload>, Self::Error>> + Send;
}

/// Resolves commerce ids to storefront handles.
///
/// Lookups never fail: any error is logged by the implementation and
/// reported as `None` so callers can fall back to id-based paths.
pub trait HandleSource: Send + Sync + 'static {
    fn lookup_handle(
        &self,
        id: &str,
        kind: CatalogKind,
    ) -> impl Future<Output = Option<String>> + Send;
}

impl NavigationSource for FrontendApiClient {
    type Error = CaasError;

    fn fetch_tree(
        &self,
        cms_locale: &str,
    ) -> impl Future<Output = Result<NavigationTree, CaasError>> + Send {
        self.fetch_navigation("/", cms_locale)
    }
}

impl PageSource for FrontendApiClient {
    type Error = CaasError;

    fn fetch_page(
        &self,
        target: &PageTarget,
    ) -> impl Future<Output = Result<Option<PagePayload>, CaasError>> + Send {
        self.find_page(target)
    }

    fn fetch_element(
        &self,
        caas_document_id: &str,
        cms_locale: &str,
    ) -> impl Future<Output = Result<Option<PagePayload>, CaasError>> + Send {
        self.find_element(caas_document_id, cms_locale)
    }
}

impl HandleSource for StorefrontClient {
    fn lookup_handle(
        &self,
        id: &str,
        kind: CatalogKind,
    ) -> impl Future<Output = Option<String>> + Send {
        async move {
            match self.get_handle(id, kind).await {
                Ok(Some(handle)) => Some(handle),
                Ok(None) => {
                    tracing::warn!(id, %kind, "storefront resource not found");
                    None
                }
                Err(e) => {
                    tracing::warn!(id, %kind, error = %e, "storefront handle lookup failed");
                    None
                }
            }
        }
    }
}
