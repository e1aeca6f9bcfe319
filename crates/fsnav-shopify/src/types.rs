use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use fsnav_core::navigation::CONTENTPAGE_TEMPLATE;
use fsnav_core::{CatalogKind, PageTarget};

/// GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HandleNode {
    pub handle: String,
}

/// `{ product | collection | page: { handle } | null }`
#[derive(Debug, Deserialize)]
pub(crate) struct HandleData {
    #[serde(alias = "collection", alias = "page")]
    pub product: Option<HandleNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageData {
    pub page: Option<ShopifyPage>,
}

/// A Shopify online-store page as returned by `page(handle:)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopifyPage {
    /// Global id, `gid://shopify/Page/<n>`.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub seo: Option<ShopifySeo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopifySeo {
    pub title: Option<String>,
    pub description: Option<String>,
}

const PAGE_GID_PREFIX: &str = "gid://shopify/Page/";

impl ShopifyPage {
    /// Numeric page id without the `gid://shopify/Page/` prefix.
    #[must_use]
    pub fn numeric_id(&self) -> &str {
        self.id.strip_prefix(PAGE_GID_PREFIX).unwrap_or(&self.id)
    }

    /// Commerce-anchored CMS page target for this page.
    #[must_use]
    pub fn page_target(&self, cms_locale: &str) -> PageTarget {
        let mut target =
            PageTarget::commerce_anchored(self.numeric_id(), cms_locale, CatalogKind::Content.as_str());
        target.fs_page_template = Some(CONTENTPAGE_TEMPLATE.to_string());
        target.display_names = BTreeMap::from([
            ("DE".to_string(), self.title.clone()),
            ("EN".to_string(), self.title.clone()),
        ]);
        target
    }
}

/// Shopify GraphQL type name for a catalog kind.
#[must_use]
pub fn shopify_type(kind: CatalogKind) -> &'static str {
    match kind {
        CatalogKind::Product => "Product",
        CatalogKind::Category => "Collection",
        CatalogKind::Content => "Page",
    }
}

/// Global id for a numeric commerce id.
#[must_use]
pub fn global_id(kind: CatalogKind, id: &str) -> String {
    format!("gid://shopify/{}/{id}", shopify_type(kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> ShopifyPage {
        ShopifyPage {
            id: "gid://shopify/Page/118".to_string(),
            title: "Über uns".to_string(),
            body: None,
            seo: None,
        }
    }

    #[test]
    fn page_target_is_commerce_anchored_content_page() {
        let target = page().page_target("de_DE");
        assert_eq!(target.id.as_deref(), Some("118"));
        assert!(!target.is_fs_driven);
        assert_eq!(target.page_type, "content");
        assert_eq!(target.fs_page_template.as_deref(), Some("contentpage"));
        assert_eq!(target.display_names.get("DE").map(String::as_str), Some("Über uns"));
        assert!(target.is_valid());
    }

    #[test]
    fn global_id_uses_shopify_type_names() {
        assert_eq!(global_id(CatalogKind::Category, "7"), "gid://shopify/Collection/7");
        assert_eq!(global_id(CatalogKind::Product, "8"), "gid://shopify/Product/8");
        assert_eq!(global_id(CatalogKind::Content, "9"), "gid://shopify/Page/9");
    }

    #[test]
    fn handle_data_accepts_every_query_root() {
        for root in ["product", "collection", "page"] {
            let json = format!(r#"{{"{root}": {{"handle": "h"}}}}"#);
            let data: HandleData = serde_json::from_str(&json).unwrap();
            assert_eq!(data.product.map(|n| n.handle).as_deref(), Some("h"));
        }
    }
}
