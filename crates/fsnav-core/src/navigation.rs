//! Navigation service payload types.
//!
//! A [`NavigationTree`] is the snapshot returned by the CMS navigation service
//! for one locale. It is never mutated after deserialization; a newer snapshot
//! replaces it wholesale.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::link::deserialize_scalar_id;

use crate::locale::split_locale_prefix;
use crate::page::PageTarget;

/// Page template that always resolves to the site root.
pub const HOMEPAGE_TEMPLATE: &str = "homepage";
pub const LANDINGPAGE_TEMPLATE: &str = "landingpage";
pub const CONTENTPAGE_TEMPLATE: &str = "contentpage";

/// Suffix the navigation service appends to every SEO route.
pub const SEO_ROUTE_SUFFIX: &str = ".json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationTree {
    /// Elements in the order the navigation service lists them.
    #[serde(default)]
    pub id_map: IndexMap<String, NavigationElement>,
    #[serde(default)]
    pub seo_route_map: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationElement {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub seo_route: Option<String>,
    /// Backing CaaS document. Missing until content creation in the CMS has
    /// been indexed.
    #[serde(default)]
    pub caas_document_id: Option<String>,
    #[serde(default)]
    pub custom_data: Option<CustomData>,
    #[serde(default)]
    pub parent_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomData {
    #[serde(default)]
    pub page_template: Option<String>,
    /// Commerce id; the navigation service sends it as a string or a number.
    #[serde(default, deserialize_with = "deserialize_scalar_id")]
    pub ecom_shop_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NavigationElement {
    #[must_use]
    pub fn page_template(&self) -> Option<&str> {
        self.custom_data.as_ref()?.page_template.as_deref()
    }

    #[must_use]
    pub fn ecom_shop_id(&self) -> Option<&str> {
        self.custom_data.as_ref()?.ecom_shop_id.as_deref()
    }

    /// Browser route for this element: `/` for the homepage, otherwise the
    /// SEO route without its `.json` suffix.
    #[must_use]
    pub fn seo_url(&self) -> Option<String> {
        if self.page_template() == Some(HOMEPAGE_TEMPLATE) {
            return Some("/".to_string());
        }
        self.seo_route.as_deref().map(strip_seo_suffix)
    }
}

impl NavigationTree {
    #[must_use]
    pub fn element(&self, id: &str) -> Option<&NavigationElement> {
        self.id_map.get(id)
    }

    /// Finds the element that carries the page data for a storefront path.
    ///
    /// Folder entries in the navigation have no `customData`; for those the
    /// first element listing the folder as a parent is returned instead.
    #[must_use]
    pub fn element_for_path(&self, path: &str) -> Option<&NavigationElement> {
        let (_, path) = split_locale_prefix(path);
        let seo_id = self
            .seo_route_map
            .get(&format!("/{path}{SEO_ROUTE_SUFFIX}"))?;
        let element = self.id_map.get(seo_id)?;
        if element.custom_data.is_some() {
            return Some(element);
        }
        self.id_map
            .values()
            .find(|e| e.parent_ids.iter().any(|p| p == seo_id))
    }

    /// CaaS document id for a CMS page id.
    ///
    /// `fs_page_id` is normally a navigation id. Routes decided from the SEO
    /// map already carry the CaaS id, so an id that matches an element's
    /// `caas_document_id` is returned as is.
    #[must_use]
    pub fn caas_document_id_for(&self, fs_page_id: &str) -> Option<String> {
        if let Some(element) = self.id_map.get(fs_page_id) {
            return element.caas_document_id.clone();
        }
        self.id_map
            .values()
            .any(|e| e.caas_document_id.as_deref() == Some(fs_page_id))
            .then(|| fs_page_id.to_string())
    }
}

/// Strips the `.json` suffix from an SEO route.
#[must_use]
pub fn strip_seo_suffix(route: &str) -> String {
    route.replacen(SEO_ROUTE_SUFFIX, "", 1)
}

/// Outcome of matching a storefront path against the navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageDecision {
    Landing { fs_page_id: String },
    Content { fs_page_id: String },
    NotFound,
}

impl PageDecision {
    /// CMS-driven page target for this decision, in the given CMS locale.
    #[must_use]
    pub fn page_target(&self, cms_locale: &str) -> Option<PageTarget> {
        let (fs_page_id, template) = match self {
            PageDecision::Landing { fs_page_id } => (fs_page_id, LANDINGPAGE_TEMPLATE),
            PageDecision::Content { fs_page_id } => (fs_page_id, CONTENTPAGE_TEMPLATE),
            PageDecision::NotFound => return None,
        };
        Some(PageTarget::fs_driven(fs_page_id, cms_locale, template))
    }
}

/// Decides which CMS page a storefront path renders.
#[must_use]
pub fn decide_page(tree: &NavigationTree, path: &str) -> PageDecision {
    let Some(element) = tree.element_for_path(path) else {
        return PageDecision::NotFound;
    };
    let Some(caas_id) = element.caas_document_id.clone() else {
        return PageDecision::NotFound;
    };
    match element.page_template() {
        Some(LANDINGPAGE_TEMPLATE) => PageDecision::Landing {
            fs_page_id: caas_id,
        },
        Some(CONTENTPAGE_TEMPLATE) => PageDecision::Content {
            fs_page_id: caas_id,
        },
        _ => PageDecision::NotFound,
    }
}

/// One menu entry for a CMS-driven content page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtraMenuEntry {
    pub navigation_id: String,
    pub route: String,
    pub label: Option<String>,
}

/// Nested menu of CMS-driven pages keyed by route segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtraMenu {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<ExtraMenuEntry>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, ExtraMenu>,
}

impl ExtraMenu {
    /// Builds the menu from every SEO route that is not a product, category
    /// or homepage route.
    #[must_use]
    pub fn from_tree(tree: &NavigationTree) -> Self {
        let mut root = ExtraMenu::default();
        for (route, id) in &tree.seo_route_map {
            if route.starts_with("/[products]")
                || route.starts_with("/[categories]")
                || route.to_lowercase().starts_with("/homepage")
            {
                continue;
            }
            let route = strip_seo_suffix(route);
            let mut node = &mut root;
            for segment in route.split('/').skip(1) {
                node = node.children.entry(segment.to_string()).or_default();
            }
            node.entry = Some(ExtraMenuEntry {
                navigation_id: id.clone(),
                label: tree.element(id).and_then(|e| e.label.clone()),
                route,
            });
        }
        root
    }

    #[must_use]
    pub fn get(&self, segments: &[&str]) -> Option<&ExtraMenu> {
        segments
            .iter()
            .try_fold(self, |node, segment| node.children.get(*segment))
    }
}
