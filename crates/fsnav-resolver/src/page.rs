//! Binding page targets to CMS page payloads.

use std::sync::Arc;

use fsnav_core::{Locale, PagePayload, PageTarget, Section};

use crate::error::PageError;
use crate::gated::{GatedCache, Loadable};
use crate::navigation::NavigationCache;
use crate::poll::{CancelToken, Poller, Sleeper, TokioSleeper};
use crate::revision::{Domain, RevisionStore};
use crate::source::{NavigationSource, PageSource};

const DEPS: &[Domain] = &[Domain::Page];

type PageCache = GatedCache<PageTarget, Option<Arc<PagePayload>>, PageError>;

pub struct PageBinder<N, P, T = TokioSleeper> {
    navigation: Arc<NavigationCache<N>>,
    poller: Arc<Poller<N, T>>,
    pages: Arc<P>,
    cache: PageCache,
    cancel: CancelToken,
}

impl<N, P, T> PageBinder<N, P, T>
where
    N: NavigationSource,
    P: PageSource,
    T: Sleeper,
{
    #[must_use]
    pub fn new(
        navigation: Arc<NavigationCache<N>>,
        poller: Arc<Poller<N, T>>,
        pages: Arc<P>,
        revisions: Arc<RevisionStore>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            navigation,
            poller,
            pages,
            cache: GatedCache::new("page", DEPS, revisions),
            cancel,
        }
    }

    /// Fetches the payload a page target points at.
    ///
    /// CMS-driven targets are first mapped to their CaaS document id through
    /// the navigation, polling while the navigation has not caught up with a
    /// freshly created page. Invalid targets resolve to `Ok(None)` without
    /// touching any upstream.
    ///
    /// # Errors
    ///
    /// Returns [`PageError`] when the navigation or page fetch fails, or the
    /// element never appears in the navigation.
    pub async fn bind_page(
        &self,
        target: &PageTarget,
    ) -> Result<Option<Arc<PagePayload>>, PageError> {
        if !target.is_valid() {
            tracing::debug!(?target, "skipping invalid page target");
            return Ok(None);
        }

        let navigation = Arc::clone(&self.navigation);
        let poller = Arc::clone(&self.poller);
        let pages = Arc::clone(&self.pages);
        let cancel = self.cancel.clone();
        let owned = target.clone();
        self.cache
            .get_or_fetch(target.clone(), move || async move {
                if owned.is_fs_driven {
                    fetch_fs_driven(&navigation, &poller, pages.as_ref(), &owned, &cancel).await
                } else {
                    fetch_commerce_anchored(pages.as_ref(), &owned).await
                }
            })
            .await
    }

    #[must_use]
    pub fn peek(&self, target: &PageTarget) -> Loadable<Option<Arc<PagePayload>>, PageError> {
        self.cache.peek(target)
    }

    #[must_use]
    pub fn fetch_count(&self) -> u64 {
        self.cache.fetch_count()
    }
}

async fn fetch_fs_driven<N, P, T>(
    navigation: &NavigationCache<N>,
    poller: &Poller<N, T>,
    pages: &P,
    target: &PageTarget,
    cancel: &CancelToken,
) -> Result<Option<Arc<PagePayload>>, PageError>
where
    N: NavigationSource,
    P: PageSource,
    T: Sleeper,
{
    let fs_page_id = target.fs_page_id.as_deref().unwrap_or_default();
    let locale = Locale::from_cms(&target.locale);

    let tree = navigation.get_navigation(&locale).await?;
    let caas_id = match tree.caas_document_id_for(fs_page_id) {
        Some(id) => id,
        None => {
            tracing::info!(fs_page_id, locale = %locale, "page not in navigation yet, polling");
            let element = poller
                .poll_until_present(
                    fs_page_id,
                    &locale,
                    |e| e.caas_document_id.is_some(),
                    cancel,
                )
                .await?;
            element.caas_document_id.unwrap_or_default()
        }
    };

    match pages.fetch_element(&caas_id, locale.cms()).await {
        Ok(payload) => Ok(payload.map(Arc::new)),
        Err(e) => {
            tracing::warn!(fs_page_id, caas_id = %caas_id, error = %e, "page element fetch failed");
            Err(PageError::Fetch {
                page: caas_id,
                source: Arc::new(e),
            })
        }
    }
}

async fn fetch_commerce_anchored<P: PageSource>(
    pages: &P,
    target: &PageTarget,
) -> Result<Option<Arc<PagePayload>>, PageError> {
    let id = target.id.clone().unwrap_or_default();
    match pages.fetch_page(target).await {
        Ok(payload) => Ok(payload.map(Arc::new)),
        Err(e) => {
            tracing::warn!(id = %id, page_type = %target.page_type, error = %e, "page fetch failed");
            Err(PageError::Fetch {
                page: id,
                source: Arc::new(e),
            })
        }
    }
}

/// Sections of one named slot. Unknown or empty slots yield an empty slice.
#[must_use]
pub fn extract_slot<'a>(payload: &'a PagePayload, slot: &str) -> &'a [Section] {
    payload.slot(slot)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::poll::PollConfig;
    use crate::test_support::{
        payload, sample_tree, tree_with, FakeNavigation, FakePages, RecordingSleeper,
    };

    struct Fixture {
        binder: PageBinder<FakeNavigation, FakePages, RecordingSleeper>,
        navigation: Arc<FakeNavigation>,
        pages: Arc<FakePages>,
        revisions: Arc<RevisionStore>,
    }

    fn fixture(navigation: FakeNavigation, pages: FakePages) -> Fixture {
        let navigation = Arc::new(navigation);
        let pages = Arc::new(pages);
        let revisions = Arc::new(RevisionStore::new());
        let cache = Arc::new(NavigationCache::new(
            Arc::clone(&navigation),
            Arc::clone(&revisions),
        ));
        let poller = Arc::new(Poller::new(
            Arc::clone(&cache),
            Arc::clone(&revisions),
            RecordingSleeper::default(),
            PollConfig::default(),
        ));
        let binder = PageBinder::new(
            cache,
            poller,
            Arc::clone(&pages),
            Arc::clone(&revisions),
            CancelToken::new(),
        );
        Fixture {
            binder,
            navigation,
            pages,
            revisions,
        }
    }

    #[test]
    fn extract_slot_on_missing_or_empty_slot_is_empty() {
        let payload = payload("p");
        assert!(extract_slot(&payload, "content").is_empty());
        assert!(extract_slot(&payload, "footer").is_empty());
        assert!(extract_slot(&PagePayload::default(), "stage").is_empty());
        assert_eq!(extract_slot(&payload, "stage").len(), 1);
    }

    #[tokio::test]
    async fn fs_driven_target_fetches_element_by_caas_id() {
        let f = fixture(
            FakeNavigation::always(sample_tree()),
            FakePages::default().with_element("caas-about"),
        );
        let target = PageTarget::fs_driven("about", "de_DE", "contentpage");

        let payload = f.binder.bind_page(&target).await.unwrap().unwrap();
        assert_eq!(payload.id.as_deref(), Some("caas-about"));
        assert_eq!(f.pages.requests(), vec!["element:caas-about:de_DE"]);
        assert_eq!(f.navigation.locales(), vec!["de_DE"]);
    }

    #[tokio::test]
    async fn decided_routes_carry_caas_id_directly() {
        let f = fixture(
            FakeNavigation::always(sample_tree()),
            FakePages::default().with_element("caas-about"),
        );
        let target = PageTarget::fs_driven("caas-about", "en_GB", "contentpage");
        let payload = f.binder.bind_page(&target).await.unwrap();
        assert!(payload.is_some());
        assert_eq!(f.navigation.calls(), 1);
    }

    #[tokio::test]
    async fn commerce_anchored_target_uses_find_page() {
        let f = fixture(
            FakeNavigation::always(sample_tree()),
            FakePages::default().with_page("118"),
        );
        let target = PageTarget::commerce_anchored("118", "en_GB", "content");
        let payload = f.binder.bind_page(&target).await.unwrap().unwrap();
        assert_eq!(payload.id.as_deref(), Some("page-118"));
        assert_eq!(f.pages.requests(), vec!["page:118"]);
        assert_eq!(f.navigation.calls(), 0);
    }

    #[tokio::test]
    async fn invalid_targets_resolve_to_none_without_fetching() {
        let f = fixture(FakeNavigation::always(sample_tree()), FakePages::default());
        let mut fs_driven = PageTarget::fs_driven("about", "en_GB", "contentpage");
        fs_driven.fs_page_id = None;
        let mut anchored = PageTarget::commerce_anchored("1", "en_GB", "content");
        anchored.id = Some(String::new());

        assert_eq!(f.binder.bind_page(&fs_driven).await.unwrap(), None);
        assert_eq!(f.binder.bind_page(&anchored).await.unwrap(), None);
        assert!(f.pages.requests().is_empty());
        assert_eq!(f.navigation.calls(), 0);
    }

    #[tokio::test]
    async fn payload_is_cached_until_page_bump() {
        let f = fixture(
            FakeNavigation::always(sample_tree()),
            FakePages::default().with_page("118"),
        );
        let target = PageTarget::commerce_anchored("118", "en_GB", "content");

        f.binder.bind_page(&target).await.unwrap();
        f.binder.bind_page(&target).await.unwrap();
        assert_eq!(f.pages.requests().len(), 1);

        f.revisions.bump(Domain::Navigation);
        f.binder.bind_page(&target).await.unwrap();
        assert_eq!(f.pages.requests().len(), 1);

        f.revisions.bump(Domain::Page);
        f.binder.bind_page(&target).await.unwrap();
        assert_eq!(f.pages.requests().len(), 2);
        assert_eq!(f.binder.fetch_count(), 2);
    }

    #[tokio::test]
    async fn missing_caas_id_polls_navigation() {
        let fresh = json!({
            "id": "new-page",
            "seoRoute": "/New.json",
            "caasDocumentId": "caas-new",
            "customData": { "pageTemplate": "contentpage" }
        });
        let script = vec![
            Ok(sample_tree()),
            Ok(sample_tree()),
            Ok(tree_with("new-page", fresh)),
        ];
        let f = fixture(
            FakeNavigation::scripted(script),
            FakePages::default().with_element("caas-new"),
        );
        let target = PageTarget::fs_driven("new-page", "en_GB", "contentpage");

        let payload = f.binder.bind_page(&target).await.unwrap().unwrap();
        assert_eq!(payload.id.as_deref(), Some("caas-new"));
        assert_eq!(f.navigation.calls(), 3);
        assert_eq!(f.revisions.current(Domain::Navigation), 1);
    }

    #[tokio::test]
    async fn page_fetch_failure_is_reported_and_not_cached() {
        let f = fixture(FakeNavigation::always(sample_tree()), FakePages::default());
        let target = PageTarget::commerce_anchored("broken", "en_GB", "content");

        let err = f.binder.bind_page(&target).await.unwrap_err();
        assert!(matches!(err, PageError::Fetch { ref page, .. } if page == "broken"));
        assert!(matches!(f.binder.peek(&target), Loadable::Empty));
    }
}
