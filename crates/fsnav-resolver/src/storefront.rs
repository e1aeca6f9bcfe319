//! The storefront store: revisions, caches, resolver and poller wired
//! together once at startup.

use std::sync::Arc;

use serde::Serialize;

use fsnav_core::{
    decide_page, split_locale_prefix, CatalogKind, ExtraMenu, LinkReference, Locale,
    NavigationTree, PageDecision, PagePayload, PageTarget,
};

use crate::error::{NavigationError, PageError};
use crate::gated::{GatedCache, Loadable};
use crate::navigation::NavigationCache;
use crate::page::PageBinder;
use crate::poll::{CancelToken, PollConfig, Poller, Sleeper, TokioSleeper};
use crate::reference::{seo_url, ReferenceResolver};
use crate::revision::{Domain, RevisionSnapshot, RevisionStore};
use crate::source::{HandleSource, NavigationSource, PageSource};

const EXTRA_MENU_DEPS: &[Domain] = &[Domain::Navigation, Domain::ExtraMenu];

/// Which CMS page a storefront path renders, in which locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDecision {
    pub locale: Locale,
    pub decision: PageDecision,
    pub target: Option<PageTarget>,
}

pub struct Storefront<N, P, H, T = TokioSleeper> {
    revisions: Arc<RevisionStore>,
    navigation: Arc<NavigationCache<N>>,
    poller: Arc<Poller<N, T>>,
    resolver: ReferenceResolver<H>,
    pages: PageBinder<N, P, T>,
    extra_menu: GatedCache<String, Arc<ExtraMenu>, NavigationError>,
    default_locale: Locale,
    cancel: CancelToken,
}

impl<N, P, H, T> Storefront<N, P, H, T>
where
    N: NavigationSource,
    P: PageSource,
    H: HandleSource,
    T: Sleeper,
{
    #[must_use]
    pub fn new(
        navigation_source: Arc<N>,
        page_source: Arc<P>,
        handles: Arc<H>,
        sleeper: T,
        poll_config: PollConfig,
        default_locale: Locale,
    ) -> Self {
        let revisions = Arc::new(RevisionStore::new());
        let cancel = CancelToken::new();
        let navigation = Arc::new(NavigationCache::new(
            navigation_source,
            Arc::clone(&revisions),
        ));
        let poller = Arc::new(Poller::new(
            Arc::clone(&navigation),
            Arc::clone(&revisions),
            sleeper,
            poll_config,
        ));
        let pages = PageBinder::new(
            Arc::clone(&navigation),
            Arc::clone(&poller),
            page_source,
            Arc::clone(&revisions),
            cancel.clone(),
        );
        Self {
            extra_menu: GatedCache::new("extra_menu", EXTRA_MENU_DEPS, Arc::clone(&revisions)),
            resolver: ReferenceResolver::new(handles),
            revisions,
            navigation,
            poller,
            pages,
            default_locale,
            cancel,
        }
    }

    #[must_use]
    pub fn revisions(&self) -> &Arc<RevisionStore> {
        &self.revisions
    }

    pub fn bump(&self, domain: Domain) -> u64 {
        self.revisions.bump(domain)
    }

    #[must_use]
    pub fn snapshot(&self) -> RevisionSnapshot {
        self.revisions.snapshot()
    }

    #[must_use]
    pub fn default_locale(&self) -> &Locale {
        &self.default_locale
    }

    #[must_use]
    pub fn poller(&self) -> &Arc<Poller<N, T>> {
        &self.poller
    }

    #[must_use]
    pub fn resolver(&self) -> &ReferenceResolver<H> {
        &self.resolver
    }

    /// # Errors
    ///
    /// Returns [`NavigationError`] when the navigation fetch fails.
    pub async fn get_navigation(
        &self,
        locale: &Locale,
    ) -> Result<Arc<NavigationTree>, NavigationError> {
        self.navigation.get_navigation(locale).await
    }

    #[must_use]
    pub fn peek_navigation(&self, locale: &Locale) -> Loadable<Arc<NavigationTree>, NavigationError> {
        self.navigation.peek(locale)
    }

    /// Resolves a link against the navigation of `locale`.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError`] when the navigation fetch fails.
    pub async fn resolve_reference(
        &self,
        link: &LinkReference,
        locale: &Locale,
    ) -> Result<Option<String>, NavigationError> {
        if link.is_external() {
            return Ok(self
                .resolver
                .resolve(link, &NavigationTree::default(), locale)
                .await);
        }
        let tree = self.get_navigation(locale).await?;
        Ok(self.resolver.resolve(link, &tree, locale).await)
    }

    /// SEO route of a page in another locale's navigation, without locale
    /// prefix. Used by language switchers.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError`] when the navigation fetch fails.
    pub async fn localized_seo_url(
        &self,
        page_ref: &str,
        locale: &Locale,
    ) -> Result<Option<String>, NavigationError> {
        let tree = self.get_navigation(locale).await?;
        Ok(seo_url(&tree, page_ref))
    }

    pub async fn shop_link(&self, id: &str, kind: CatalogKind, locale: &Locale) -> Option<String> {
        self.resolver.shop_link(id, kind, locale).await
    }

    /// Menu of CMS-driven pages for `locale`.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError`] when the navigation fetch fails.
    pub async fn extra_menu(&self, locale: &Locale) -> Result<Arc<ExtraMenu>, NavigationError> {
        let navigation = Arc::clone(&self.navigation);
        let owned = locale.clone();
        self.extra_menu
            .get_or_fetch(locale.cms().to_string(), move || async move {
                let tree = navigation.get_navigation(&owned).await?;
                Ok(Arc::new(ExtraMenu::from_tree(&tree)))
            })
            .await
    }

    /// Decides which CMS page renders a storefront path.
    ///
    /// A leading `xx-yy/` segment selects the locale; unprefixed paths use
    /// `fallback`, or the default locale when none is given.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError`] when the navigation fetch fails.
    pub async fn decide_route(
        &self,
        path: &str,
        fallback: Option<&Locale>,
    ) -> Result<RouteDecision, NavigationError> {
        let locale = match split_locale_prefix(path) {
            (Some(prefix), _) => Locale::from_commerce(prefix),
            (None, _) => fallback.unwrap_or(&self.default_locale).clone(),
        };
        let tree = self.get_navigation(&locale).await?;
        let decision = decide_page(&tree, path);
        tracing::debug!(path, locale = %locale, ?decision, "route decided");
        let target = decision.page_target(locale.cms());
        Ok(RouteDecision {
            locale,
            decision,
            target,
        })
    }

    /// # Errors
    ///
    /// Returns [`PageError`] when the page cannot be fetched.
    pub async fn bind_page(
        &self,
        target: &PageTarget,
    ) -> Result<Option<Arc<PagePayload>>, PageError> {
        self.pages.bind_page(target).await
    }

    /// Cancels every in-flight poll started by page binding.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
