//! Locale codec between the CMS (`de_DE`) and commerce (`de-de`) tag formats.
//!
//! The storefront addresses the same language/region pair in two encodings:
//! the CMS navigation and page APIs expect `xx_YY`, while storefront routes
//! and the commerce backend use lower-case `xx-yy`. [`Locale`] keeps both
//! encodings in sync; it can only be built through the codec.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Commerce locale that produces unprefixed storefront routes.
pub const DEFAULT_COMMERCE_LOCALE: &str = "en-gb";

static LOCALE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z]{2}-[a-z]{2})/").expect("valid regex"));

/// Converts a commerce locale (`de-de`) into a CMS locale (`de_DE`).
///
/// Input that does not split into exactly two `-` separated segments is
/// returned unchanged.
#[must_use]
pub fn to_cms_locale(commerce_locale: &str) -> String {
    let parts: Vec<&str> = commerce_locale.split('-').collect();
    match parts.as_slice() {
        [language, region] => format!("{language}_{}", region.to_uppercase()),
        _ => commerce_locale.to_string(),
    }
}

/// Converts a CMS locale (`de_DE`) into a commerce locale (`de-de`).
///
/// Replaces the first `_` with `-` and lower-cases the whole tag.
#[must_use]
pub fn to_commerce_locale(cms_locale: &str) -> String {
    cms_locale.replacen('_', "-", 1).to_lowercase()
}

/// A language/region pair in both the CMS and commerce encodings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Locale {
    cms: String,
    commerce: String,
}

impl Locale {
    /// Builds a locale from its commerce tag (`de-de`).
    #[must_use]
    pub fn from_commerce(commerce: &str) -> Self {
        let commerce = commerce.trim().to_lowercase();
        Self {
            cms: to_cms_locale(&commerce),
            commerce,
        }
    }

    /// Builds a locale from its CMS tag (`de_DE`).
    #[must_use]
    pub fn from_cms(cms: &str) -> Self {
        let cms = cms.trim();
        Self {
            cms: cms.to_string(),
            commerce: to_commerce_locale(cms),
        }
    }

    /// Builds a locale from a language and country pair (`DE`, `de`).
    #[must_use]
    pub fn from_parts(language: &str, country: &str) -> Self {
        Self::from_commerce(&format!(
            "{}-{}",
            language.to_lowercase(),
            country.to_lowercase()
        ))
    }

    #[must_use]
    pub fn cms(&self) -> &str {
        &self.cms
    }

    #[must_use]
    pub fn commerce(&self) -> &str {
        &self.commerce
    }

    /// True when routes for this locale carry no locale prefix.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.commerce.is_empty() || self.commerce == DEFAULT_COMMERCE_LOCALE
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.commerce)
    }
}

/// Prefixes `path` with the commerce locale segment.
///
/// An empty or default (`en-gb`) locale leaves the path untouched. Otherwise
/// the result is `/<locale>/<path>`, inserting the separating slash only when
/// `path` does not already start with one.
#[must_use]
pub fn build_locale_url(commerce_locale: &str, path: &str) -> String {
    if commerce_locale.is_empty() || commerce_locale == DEFAULT_COMMERCE_LOCALE {
        return path.to_string();
    }
    if path.starts_with('/') {
        format!("/{commerce_locale}{path}")
    } else {
        format!("/{commerce_locale}/{path}")
    }
}

/// Splits a leading `xx-yy/` locale segment off a storefront path.
///
/// Returns the locale (if any) and the remaining path without a leading slash.
#[must_use]
pub fn split_locale_prefix(path: &str) -> (Option<&str>, &str) {
    let path = path.trim_start_matches('/');
    match LOCALE_PREFIX_RE.captures(path).and_then(|c| c.get(1)) {
        Some(m) => (Some(m.as_str()), &path[m.end() + 1..]),
        None => (None, path),
    }
}
