use std::sync::Arc;

use fsnav_core::{Locale, NavigationTree};

use crate::error::NavigationError;
use crate::gated::{GatedCache, Loadable};
use crate::revision::{Domain, RevisionStore};
use crate::source::NavigationSource;

const DEPS: &[Domain] = &[Domain::Navigation];

/// Navigation trees per CMS locale, refetched after every navigation bump.
pub struct NavigationCache<S> {
    source: Arc<S>,
    cache: GatedCache<String, Arc<NavigationTree>, NavigationError>,
}

impl<S: NavigationSource> NavigationCache<S> {
    #[must_use]
    pub fn new(source: Arc<S>, revisions: Arc<RevisionStore>) -> Self {
        Self {
            source,
            cache: GatedCache::new("navigation", DEPS, revisions),
        }
    }

    /// Cached tree for `locale`, fetched when the navigation revision moved
    /// since the last fetch for that locale.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::Fetch`] when the upstream fetch fails.
    pub async fn get_navigation(
        &self,
        locale: &Locale,
    ) -> Result<Arc<NavigationTree>, NavigationError> {
        let cms_locale = locale.cms().to_string();
        let source = Arc::clone(&self.source);
        self.cache
            .get_or_fetch(cms_locale.clone(), move || async move {
                fetch_tree(source.as_ref(), &cms_locale).await
            })
            .await
    }

    /// Fetches a tree directly from the source, bypassing and not touching
    /// the cache.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::Fetch`] when the upstream fetch fails.
    pub async fn fetch_fresh(
        &self,
        locale: &Locale,
    ) -> Result<Arc<NavigationTree>, NavigationError> {
        fetch_tree(self.source.as_ref(), locale.cms()).await
    }

    #[must_use]
    pub fn peek(&self, locale: &Locale) -> Loadable<Arc<NavigationTree>, NavigationError> {
        self.cache.peek(&locale.cms().to_string())
    }

    #[must_use]
    pub fn fetch_count(&self) -> u64 {
        self.cache.fetch_count()
    }
}

async fn fetch_tree<S: NavigationSource>(
    source: &S,
    cms_locale: &str,
) -> Result<Arc<NavigationTree>, NavigationError> {
    match source.fetch_tree(cms_locale).await {
        Ok(tree) => {
            tracing::debug!(
                locale = cms_locale,
                elements = tree.id_map.len(),
                "navigation fetched"
            );
            Ok(Arc::new(tree))
        }
        Err(e) => {
            tracing::warn!(locale = cms_locale, error = %e, "navigation fetch failed");
            Err(NavigationError::Fetch {
                locale: cms_locale.to_string(),
                source: Arc::new(e),
            })
        }
    }
}
