//! Page targets and CMS page payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifies which CMS page payload to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTarget {
    /// Commerce-side id, used when the page is not CMS-driven.
    #[serde(default)]
    pub id: Option<String>,
    /// Navigation id (or CaaS document id once resolved) of a CMS-driven page.
    #[serde(default)]
    pub fs_page_id: Option<String>,
    /// CMS locale, e.g. `de_DE`.
    pub locale: String,
    #[serde(rename = "type")]
    pub page_type: String,
    #[serde(default)]
    pub fs_page_template: Option<String>,
    #[serde(default)]
    pub is_fs_driven: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub display_names: BTreeMap<String, String>,
}

impl PageTarget {
    #[must_use]
    pub fn fs_driven(fs_page_id: &str, cms_locale: &str, template: &str) -> Self {
        Self {
            id: None,
            fs_page_id: Some(fs_page_id.to_string()),
            locale: cms_locale.to_string(),
            page_type: "content".to_string(),
            fs_page_template: Some(template.to_string()),
            is_fs_driven: true,
            display_names: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn commerce_anchored(id: &str, cms_locale: &str, page_type: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            fs_page_id: None,
            locale: cms_locale.to_string(),
            page_type: page_type.to_string(),
            fs_page_template: None,
            is_fs_driven: false,
            display_names: BTreeMap::new(),
        }
    }

    /// A CMS-driven target needs `fs_page_id`, a commerce-anchored one needs `id`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        if self.is_fs_driven {
            self.fs_page_id.as_deref().is_some_and(|id| !id.is_empty())
        } else {
            self.id.as_deref().is_some_and(|id| !id.is_empty())
        }
    }
}

/// Page payload as returned by `findPage` / `findElement`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preview_id: Option<String>,
    #[serde(default)]
    pub children: Vec<Slot>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Named region of a page holding an ordered list of sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub name: String,
    #[serde(default)]
    pub children: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub section_type: String,
    #[serde(default)]
    pub preview_id: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub children: Vec<Value>,
}

/// Presentation component family selected by a section's `sectionType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Banner,
    Carousel,
    FeaturedProducts,
    InteractiveImage,
    InteractiveYoutubeVideo,
    TextImage,
    Other,
}

impl Section {
    #[must_use]
    pub fn kind(&self) -> SectionKind {
        match self.section_type.as_str() {
            "banner" => SectionKind::Banner,
            "carousel" => SectionKind::Carousel,
            "featured_products" => SectionKind::FeaturedProducts,
            "interactive_image" => SectionKind::InteractiveImage,
            "interactive_youtube_video" => SectionKind::InteractiveYoutubeVideo,
            "text_image" => SectionKind::TextImage,
            _ => SectionKind::Other,
        }
    }
}

impl PagePayload {
    /// Sections of the named slot, in authoring order. Unknown slots are empty.
    #[must_use]
    pub fn slot(&self, slot_name: &str) -> &[Section] {
        self.children
            .iter()
            .find(|slot| slot.name == slot_name)
            .map_or(&[], |slot| slot.children.as_slice())
    }
}
