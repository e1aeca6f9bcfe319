//! CMS link references.
//!
//! Links arrive from the CMS as loosely-shaped JSON with a `template`
//! discriminant and a `data` payload whose field names depend on the
//! template. [`LinkReference::from_json`] decodes that shape once so the
//! resolver can match on a closed set of variants.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Commerce resource kinds that have a storefront handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Product,
    Category,
    Content,
}

impl CatalogKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CatalogKind::Product => "product",
            CatalogKind::Category => "category",
            CatalogKind::Content => "content",
        }
    }

    /// Storefront route prefix for this kind.
    #[must_use]
    pub fn route_prefix(self) -> &'static str {
        match self {
            CatalogKind::Product => "/products",
            CatalogKind::Category => "/collections",
            CatalogKind::Content => "/pages",
        }
    }

    /// Storefront path for a handle (or raw id) of this kind.
    #[must_use]
    pub fn path(self, handle: &str) -> String {
        format!("{}/{handle}", self.route_prefix())
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(CatalogKind::Product),
            "category" => Ok(CatalogKind::Category),
            "content" => Ok(CatalogKind::Content),
            other => Err(format!("unknown catalog kind \"{other}\"")),
        }
    }
}

/// A decoded CMS link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkReference {
    /// `external_link`: a literal URL.
    External { url: Option<String> },
    /// `internal_link`: reference to a navigation page.
    Internal { page_ref: Option<String> },
    /// `content_link`: reference to a navigation page.
    Content { page_ref: Option<String> },
    /// `category_link`: commerce category id.
    Category { category_id: Option<String> },
    /// `product_link`: commerce product id.
    Product { product_id: Option<String> },
    /// `cta_link`: wraps another link.
    CallToAction(Option<Box<LinkReference>>),
    /// A bare `{type: "Reference", referenceType: "PageRef"}` object.
    PageRef { reference_id: String },
    Unrecognized { template: Option<String> },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLink {
    #[serde(rename = "type")]
    kind: Option<String>,
    reference_type: Option<String>,
    reference_id: Option<String>,
    template: Option<String>,
    #[serde(default)]
    data: Value,
}

impl LinkReference {
    /// Decodes a CMS link object. Returns `None` for `null` or non-object input.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        let raw = RawLink::deserialize(value).ok()?;

        if raw.kind.as_deref() == Some("Reference") && raw.reference_type.as_deref() == Some("PageRef")
        {
            if let Some(reference_id) = raw.reference_id {
                return Some(LinkReference::PageRef { reference_id });
            }
        }

        let data = &raw.data;
        let link = match raw.template.as_deref() {
            Some("external_link" | "dom_external_link") => LinkReference::External {
                url: string_at(data, &["lt_linkUrl"]),
            },
            Some("internal_link" | "dom_internal_link") => LinkReference::Internal {
                page_ref: string_at(data, &["lt_pageref", "referenceId"]),
            },
            Some("content_link" | "dom_content_link") => LinkReference::Content {
                page_ref: string_at(data, &["lt_pageref", "referenceId"]),
            },
            Some("category_link" | "dom_category_link") => LinkReference::Category {
                category_id: catalog_identifier(data, "lt_category"),
            },
            Some("product_link" | "dom_product_link") => LinkReference::Product {
                product_id: catalog_identifier(data, "lt_product"),
            },
            Some("cta_link") => LinkReference::CallToAction(
                data.get("lt_link")
                    .and_then(LinkReference::from_json)
                    .map(Box::new),
            ),
            other => LinkReference::Unrecognized {
                template: other.map(str::to_owned),
            },
        };
        Some(link)
    }

    /// True for links that leave the storefront.
    #[must_use]
    pub fn is_external(&self) -> bool {
        match self {
            LinkReference::External { .. } => true,
            LinkReference::CallToAction(Some(inner)) => inner.is_external(),
            _ => false,
        }
    }
}

fn string_at(data: &Value, path: &[&str]) -> Option<String> {
    let value = path.iter().try_fold(data, |v, key| v.get(*key))?;
    scalar_to_string(value)
}

/// `data.<field>.value[0].identifier` as used by catalog links.
fn catalog_identifier(data: &Value, field: &str) -> Option<String> {
    let value = data.get(field)?.get("value")?.get(0)?.get("identifier")?;
    scalar_to_string(value)
}

/// Deserializes an optional commerce id sent as a JSON string or number.
/// Other shapes (and empty strings) become `None`.
pub(crate) fn deserialize_scalar_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_to_string))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_external_link_and_dom_alias() {
        for template in ["external_link", "dom_external_link"] {
            let link = LinkReference::from_json(&json!({
                "template": template,
                "data": { "lt_linkUrl": "https://example.com/a?b=c" }
            }));
            assert_eq!(
                link,
                Some(LinkReference::External {
                    url: Some("https://example.com/a?b=c".to_string())
                })
            );
        }
    }

    #[test]
    fn decodes_internal_and_content_page_refs() {
        let internal = LinkReference::from_json(&json!({
            "template": "dom_internal_link",
            "data": { "lt_pageref": { "referenceId": "page-1" } }
        }));
        assert_eq!(
            internal,
            Some(LinkReference::Internal {
                page_ref: Some("page-1".to_string())
            })
        );

        let content = LinkReference::from_json(&json!({
            "template": "content_link",
            "data": {}
        }));
        assert_eq!(content, Some(LinkReference::Content { page_ref: None }));
    }

    #[test]
    fn decodes_catalog_identifiers_including_numbers() {
        let product = LinkReference::from_json(&json!({
            "template": "product_link",
            "data": { "lt_product": { "value": [{ "identifier": 8_123_456_789_u64 }] } }
        }));
        assert_eq!(
            product,
            Some(LinkReference::Product {
                product_id: Some("8123456789".to_string())
            })
        );

        let category = LinkReference::from_json(&json!({
            "template": "dom_category_link",
            "data": { "lt_category": { "value": [] } }
        }));
        assert_eq!(category, Some(LinkReference::Category { category_id: None }));
    }

    #[test]
    fn decodes_nested_cta_link() {
        let link = LinkReference::from_json(&json!({
            "template": "cta_link",
            "data": {
                "lt_link": {
                    "template": "external_link",
                    "data": { "lt_linkUrl": "https://example.com" }
                }
            }
        }))
        .unwrap();
        assert!(link.is_external());
        assert!(matches!(link, LinkReference::CallToAction(Some(_))));
    }

    #[test]
    fn decodes_bare_page_reference() {
        let link = LinkReference::from_json(&json!({
            "type": "Reference",
            "referenceType": "PageRef",
            "referenceId": "page-9"
        }));
        assert_eq!(
            link,
            Some(LinkReference::PageRef {
                reference_id: "page-9".to_string()
            })
        );
    }

    #[test]
    fn unknown_template_is_unrecognized_and_null_is_none() {
        let link = LinkReference::from_json(&json!({ "template": "mailto_link", "data": {} }));
        assert_eq!(
            link,
            Some(LinkReference::Unrecognized {
                template: Some("mailto_link".to_string())
            })
        );
        assert_eq!(LinkReference::from_json(&Value::Null), None);
    }

    #[test]
    fn catalog_kind_parses_and_builds_paths() {
        assert_eq!("category".parse::<CatalogKind>(), Ok(CatalogKind::Category));
        assert!("collection".parse::<CatalogKind>().is_err());
        assert_eq!(CatalogKind::Category.path("shoes"), "/collections/shoes");
        assert_eq!(CatalogKind::Content.path("faq"), "/pages/faq");
    }
}
