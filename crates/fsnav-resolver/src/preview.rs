//! Editor preview sessions.
//!
//! While a page is open in the CMS editor, the editor emits events (content
//! changed, page created, "show me this element" and so on). A
//! [`PreviewSession`] turns each event into revision bumps on the shared
//! [`Storefront`] plus a list of effects for the frontend to apply.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use fsnav_core::navigation::{
    CONTENTPAGE_TEMPLATE, HOMEPAGE_TEMPLATE, LANDINGPAGE_TEMPLATE,
};
use fsnav_core::{build_locale_url, CatalogKind, Locale, NavigationElement};

use crate::poll::{CancelToken, Sleeper, TokioSleeper};
use crate::revision::Domain;
use crate::source::{HandleSource, NavigationSource, PageSource};
use crate::storefront::Storefront;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum EditorEvent {
    ContentChanged,
    SectionCreated,
    SectionCreationCancelled,
    EnsuredPageExists,
    RerenderView,
    StartSharedPreview,
    EndSharedPreview,
    PageCreating,
    PageCreationFailed,
    /// `preview_id` is `<navigation id>.<cms locale>`.
    RequestPreviewElement { preview_id: String },
    PageCreated { preview_id: String },
    OpenStorefrontUrl {
        id: String,
        #[serde(rename = "type")]
        kind: String,
    },
}

impl EditorEvent {
    /// Shared preview events are honoured outside the editor too.
    #[must_use]
    pub fn is_editor_only(&self) -> bool {
        !matches!(self, Self::StartSharedPreview | Self::EndSharedPreview)
    }
}

/// Overlay shown while the editor performs a long-running action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcomAction {
    Default,
    ChangeLanguage,
    CreatingSection,
    EnsuringPageExists,
    PageCreating,
}

impl EcomAction {
    #[must_use]
    pub fn message_id(self) -> &'static str {
        match self {
            Self::Default => "ecom_action_modal.default",
            Self::ChangeLanguage => "ecom_action_modal.change_langauge",
            Self::CreatingSection => "ecom_action_modal.creating_section",
            Self::EnsuringPageExists => "ecom_action_modal.ensuring_page_exists",
            Self::PageCreating => "ecom_action_modal.page_creating",
        }
    }

    #[must_use]
    pub fn default_message(self) -> &'static str {
        match self {
            Self::Default => "Performing Action",
            Self::ChangeLanguage => "Changing Language",
            Self::CreatingSection => "Creating Section",
            Self::EnsuringPageExists => "Find or Create Page",
            Self::PageCreating => "Creating Page",
        }
    }
}

impl Serialize for EcomAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("EcomAction", 2)?;
        state.serialize_field("messageId", self.message_id())?;
        state.serialize_field("defaultMessage", self.default_message())?;
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum SessionEffect {
    /// `full_reload` is set when the target lives in another locale.
    Navigate { url: String, full_reload: bool },
    ShowOverlay(EcomAction),
    CloseOverlay,
}

pub struct PreviewSession<N, P, H, T = TokioSleeper> {
    storefront: Arc<Storefront<N, P, H, T>>,
    preview: bool,
    locale: Mutex<Locale>,
    cancel: CancelToken,
}

impl<N, P, H, T> PreviewSession<N, P, H, T>
where
    N: NavigationSource,
    P: PageSource,
    H: HandleSource,
    T: Sleeper,
{
    #[must_use]
    pub fn new(storefront: Arc<Storefront<N, P, H, T>>, preview: bool) -> Self {
        let locale = storefront.default_locale().clone();
        Self {
            storefront,
            preview,
            locale: Mutex::new(locale),
            cancel: CancelToken::new(),
        }
    }

    #[must_use]
    pub fn is_preview(&self) -> bool {
        self.preview
    }

    #[must_use]
    pub fn locale(&self) -> Locale {
        self.lock_locale().clone()
    }

    /// Switches the active locale. The navigation revision is bumped so the
    /// next read fetches the new locale's tree.
    pub fn set_locale(&self, locale: Locale) {
        let previous = std::mem::replace(&mut *self.lock_locale(), locale.clone());
        if previous != locale {
            tracing::info!(from = %previous, to = %locale, "preview locale changed");
        }
        self.storefront.bump(Domain::Navigation);
    }

    /// Called on every client-side route change so pages are never served
    /// from a stale cache.
    pub fn route_changed(&self) {
        self.storefront.bump(Domain::Page);
    }

    /// Cancels polls started by this session.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub async fn handle(&self, event: EditorEvent) -> Vec<SessionEffect> {
        if event.is_editor_only() && !self.preview {
            tracing::debug!(?event, "ignoring editor event outside preview mode");
            return Vec::new();
        }
        tracing::debug!(?event, "editor event");

        match event {
            EditorEvent::ContentChanged => {
                self.storefront.bump(Domain::Page);
                self.storefront.bump(Domain::Navigation);
                self.storefront.bump(Domain::ExtraMenu);
                Vec::new()
            }
            EditorEvent::SectionCreated
            | EditorEvent::SectionCreationCancelled
            | EditorEvent::EnsuredPageExists => {
                self.storefront.bump(Domain::Page);
                vec![SessionEffect::CloseOverlay]
            }
            EditorEvent::RerenderView
            | EditorEvent::StartSharedPreview
            | EditorEvent::EndSharedPreview => {
                self.storefront.bump(Domain::Page);
                Vec::new()
            }
            EditorEvent::PageCreating => {
                vec![SessionEffect::ShowOverlay(EcomAction::PageCreating)]
            }
            EditorEvent::PageCreationFailed => vec![SessionEffect::CloseOverlay],
            EditorEvent::RequestPreviewElement { preview_id }
            | EditorEvent::PageCreated { preview_id } => {
                self.show_preview_element(&preview_id).await
            }
            EditorEvent::OpenStorefrontUrl { id, kind } => {
                self.open_storefront_url(&id, &kind).await
            }
        }
    }

    async fn show_preview_element(&self, preview_id: &str) -> Vec<SessionEffect> {
        let mut effects = Vec::new();
        let Some((id, cms_locale)) = preview_id.split_once('.') else {
            tracing::warn!(preview_id, "malformed preview id");
            return effects;
        };

        let target = Locale::from_cms(cms_locale);
        let locale_changed = self.locale() != target;
        if locale_changed {
            effects.push(SessionEffect::ShowOverlay(EcomAction::ChangeLanguage));
            self.set_locale(target.clone());
        }

        let element = match self
            .storefront
            .poller()
            .poll_until_present(id, &target, |_| true, &self.cancel)
            .await
        {
            Ok(element) => element,
            Err(e) => {
                tracing::warn!(preview_id, error = %e, "preview element not available");
                return effects;
            }
        };

        if let Some(url) = self.element_url(&element, &target).await {
            effects.push(SessionEffect::Navigate {
                url,
                full_reload: locale_changed,
            });
        }
        effects
    }

    async fn element_url(&self, element: &NavigationElement, locale: &Locale) -> Option<String> {
        let template = element.page_template()?;
        match template {
            HOMEPAGE_TEMPLATE => Some(build_locale_url(locale.commerce(), "/")),
            LANDINGPAGE_TEMPLATE | CONTENTPAGE_TEMPLATE => element
                .seo_url()
                .map(|path| build_locale_url(locale.commerce(), &path)),
            "product" | "category" => {
                let kind: CatalogKind = template.parse().ok()?;
                let Some(shop_id) = element.ecom_shop_id() else {
                    tracing::warn!(id = %element.id, template, "catalog element without shop id");
                    return None;
                };
                self.storefront.shop_link(shop_id, kind, locale).await
            }
            other => {
                tracing::debug!(id = %element.id, template = other, "no storefront route for template");
                None
            }
        }
    }

    async fn open_storefront_url(&self, id: &str, kind: &str) -> Vec<SessionEffect> {
        if id.is_empty() || id == "homepage" {
            return Vec::new();
        }
        let Ok(kind) = kind.parse::<CatalogKind>() else {
            tracing::debug!(id, kind, "unsupported storefront url type");
            return Vec::new();
        };
        let locale = self.locale();
        match self.storefront.shop_link(id, kind, &locale).await {
            Some(url) => vec![SessionEffect::Navigate {
                url,
                full_reload: false,
            }],
            None => Vec::new(),
        }
    }

    fn lock_locale(&self) -> MutexGuard<'_, Locale> {
        self.locale.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
