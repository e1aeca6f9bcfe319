//! Link reference resolution.
//!
//! Turns a decoded CMS link into a storefront route. Page links are resolved
//! against the navigation tree of the active locale; catalog links need a
//! handle lookup and fall back to the raw commerce id when it fails. Every
//! route except external URLs is locale-prefixed.

use std::sync::Arc;

use fsnav_core::{build_locale_url, CatalogKind, LinkReference, Locale, NavigationTree};

use crate::source::HandleSource;

pub struct ReferenceResolver<H> {
    handles: Arc<H>,
}

impl<H: HandleSource> ReferenceResolver<H> {
    #[must_use]
    pub fn new(handles: Arc<H>) -> Self {
        Self { handles }
    }

    #[must_use]
    pub fn handles(&self) -> &Arc<H> {
        &self.handles
    }

    /// Resolves `link` to a route. `None` when the link is unrecognized or
    /// points at something that does not exist.
    pub async fn resolve(
        &self,
        link: &LinkReference,
        tree: &NavigationTree,
        locale: &Locale,
    ) -> Option<String> {
        match unwrap_call_to_action(link)? {
            LinkReference::External { url } => url.clone(),
            LinkReference::Internal { page_ref } | LinkReference::Content { page_ref } => {
                let route = seo_url(tree, page_ref.as_deref()?)?;
                Some(build_locale_url(locale.commerce(), &route))
            }
            LinkReference::PageRef { reference_id } => {
                let route = seo_url(tree, reference_id)?;
                Some(build_locale_url(locale.commerce(), &route))
            }
            LinkReference::Category { category_id } => {
                Some(self.catalog_route(category_id.as_deref()?, CatalogKind::Category, locale).await)
            }
            LinkReference::Product { product_id } => {
                Some(self.catalog_route(product_id.as_deref()?, CatalogKind::Product, locale).await)
            }
            LinkReference::Unrecognized { template } => {
                tracing::debug!(?template, "unrecognized link template");
                None
            }
            LinkReference::CallToAction(_) => None,
        }
    }

    /// Locale-prefixed storefront route for a commerce resource, requiring a
    /// handle. Used for editor "open in storefront" requests.
    pub async fn shop_link(&self, id: &str, kind: CatalogKind, locale: &Locale) -> Option<String> {
        let handle = self.handles.lookup_handle(id, kind).await?;
        Some(build_locale_url(locale.commerce(), &kind.path(&handle)))
    }

    async fn catalog_route(&self, id: &str, kind: CatalogKind, locale: &Locale) -> String {
        let segment = match self.handles.lookup_handle(id, kind).await {
            Some(handle) => handle,
            None => {
                tracing::warn!(id, %kind, "handle lookup failed, falling back to id route");
                id.to_string()
            }
        };
        build_locale_url(locale.commerce(), &kind.path(&segment))
    }
}

/// Follows call-to-action wrappers down to the link they carry.
fn unwrap_call_to_action(link: &LinkReference) -> Option<&LinkReference> {
    let mut link = link;
    while let LinkReference::CallToAction(inner) = link {
        link = inner.as_deref()?;
    }
    Some(link)
}

/// Route of a navigation element: `/` for the homepage, otherwise its SEO
/// route without the `.json` suffix.
#[must_use]
pub fn seo_url(tree: &NavigationTree, page_id: &str) -> Option<String> {
    tree.element(page_id)?.seo_url()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_support::{sample_tree, FakeHandles};

    fn resolver(handles: FakeHandles) -> ReferenceResolver<FakeHandles> {
        ReferenceResolver::new(Arc::new(handles))
    }

    fn link(value: serde_json::Value) -> LinkReference {
        LinkReference::from_json(&value).expect("link object")
    }

    fn product_link(id: &str) -> LinkReference {
        link(json!({
            "template": "product_link",
            "data": { "lt_product": { "value": [{ "identifier": id }] } }
        }))
    }

    #[tokio::test]
    async fn external_links_ignore_locale() {
        let resolver = resolver(FakeHandles::default());
        let tree = sample_tree();
        let external = link(json!({
            "template": "external_link",
            "data": { "lt_linkUrl": "https://example.com/x" }
        }));
        for locale in ["en-gb", "de-de", "fr-fr"] {
            let route = resolver
                .resolve(&external, &tree, &Locale::from_commerce(locale))
                .await;
            assert_eq!(route.as_deref(), Some("https://example.com/x"));
        }
    }

    #[tokio::test]
    async fn product_links_use_handle_and_locale_prefix() {
        let handles = FakeHandles::default().with(CatalogKind::Product, "8123", "blue-shoes");
        let resolver = resolver(handles);
        let tree = sample_tree();
        let link = product_link("8123");

        let de = resolver.resolve(&link, &tree, &Locale::from_commerce("de-de")).await;
        assert_eq!(de.as_deref(), Some("/de-de/products/blue-shoes"));

        let gb = resolver.resolve(&link, &tree, &Locale::from_commerce("en-gb")).await;
        assert_eq!(gb.as_deref(), Some("/products/blue-shoes"));
    }

    #[tokio::test]
    async fn failed_handle_lookup_falls_back_to_raw_id() {
        let resolver = resolver(FakeHandles::default());
        let tree = sample_tree();
        let route = resolver
            .resolve(&product_link("8123"), &tree, &Locale::from_commerce("en-gb"))
            .await;
        assert_eq!(route.as_deref(), Some("/products/8123"));

        let category = link(json!({
            "template": "category_link",
            "data": { "lt_category": { "value": [{ "identifier": "77" }] } }
        }));
        let route = resolver
            .resolve(&category, &tree, &Locale::from_commerce("de-de"))
            .await;
        assert_eq!(route.as_deref(), Some("/de-de/collections/77"));
    }

    #[tokio::test]
    async fn homepage_link_resolves_to_root() {
        let resolver = resolver(FakeHandles::default());
        let tree = sample_tree();
        let home = link(json!({
            "template": "internal_link",
            "data": { "lt_pageref": { "referenceId": "home" } }
        }));
        let route = resolver.resolve(&home, &tree, &Locale::from_commerce("en-gb")).await;
        assert_eq!(route.as_deref(), Some("/"));

        let route = resolver.resolve(&home, &tree, &Locale::from_commerce("de-de")).await;
        assert_eq!(route.as_deref(), Some("/de-de/"));
    }

    #[tokio::test]
    async fn content_and_page_ref_links_use_seo_route() {
        let resolver = resolver(FakeHandles::default());
        let tree = sample_tree();
        let content = link(json!({
            "template": "dom_content_link",
            "data": { "lt_pageref": { "referenceId": "about" } }
        }));
        let page_ref = link(json!({
            "type": "Reference",
            "referenceType": "PageRef",
            "referenceId": "about"
        }));
        let locale = Locale::from_commerce("de-de");
        assert_eq!(
            resolver.resolve(&content, &tree, &locale).await.as_deref(),
            Some("/de-de/About")
        );
        assert_eq!(
            resolver.resolve(&page_ref, &tree, &locale).await.as_deref(),
            Some("/de-de/About")
        );
    }

    #[tokio::test]
    async fn missing_page_and_unknown_templates_resolve_to_none() {
        let resolver = resolver(FakeHandles::default());
        let tree = sample_tree();
        let locale = Locale::from_commerce("en-gb");
        let missing = link(json!({
            "template": "internal_link",
            "data": { "lt_pageref": { "referenceId": "gone" } }
        }));
        let unknown = link(json!({ "template": "mail_link", "data": {} }));
        let empty_cta = link(json!({ "template": "cta_link", "data": {} }));
        assert_eq!(resolver.resolve(&missing, &tree, &locale).await, None);
        assert_eq!(resolver.resolve(&unknown, &tree, &locale).await, None);
        assert_eq!(resolver.resolve(&empty_cta, &tree, &locale).await, None);
    }

    #[tokio::test]
    async fn nested_call_to_action_resolves_inner_link() {
        let handles = FakeHandles::default().with(CatalogKind::Product, "1", "cap");
        let resolver = resolver(handles);
        let tree = sample_tree();
        let cta = link(json!({
            "template": "cta_link",
            "data": { "lt_link": {
                "template": "cta_link",
                "data": { "lt_link": {
                    "template": "product_link",
                    "data": { "lt_product": { "value": [{ "identifier": "1" }] } }
                }}
            }}
        }));
        let route = resolver.resolve(&cta, &tree, &Locale::from_commerce("fr-fr")).await;
        assert_eq!(route.as_deref(), Some("/fr-fr/products/cap"));
    }

    #[tokio::test]
    async fn shop_link_requires_a_handle() {
        let handles = FakeHandles::default().with(CatalogKind::Content, "118", "about-us");
        let resolver = resolver(handles);
        let locale = Locale::from_commerce("de-de");
        assert_eq!(
            resolver.shop_link("118", CatalogKind::Content, &locale).await.as_deref(),
            Some("/de-de/pages/about-us")
        );
        assert_eq!(resolver.shop_link("9", CatalogKind::Product, &locale).await, None);
    }
}
