//! Navigation, link and page resolution for a CMS-driven storefront.
//!
//! Everything hangs off a [`Storefront`]: per-domain revision counters gate
//! the navigation, extra-menu and page caches, a [`ReferenceResolver`] turns
//! CMS links into routes, and a [`Poller`] waits for freshly created content
//! to show up in the navigation. Editor events go through a
//! [`PreviewSession`].

pub mod error;
pub mod gated;
pub mod handle;
pub mod navigation;
pub mod page;
pub mod poll;
pub mod preview;
pub mod reference;
pub mod revision;
pub mod source;
pub mod storefront;

#[cfg(test)]
mod test_support;

pub use error::{NavigationError, PageError, PollError};
pub use gated::{GatedCache, Loadable};
pub use handle::ProxyHandleClient;
pub use navigation::NavigationCache;
pub use page::{extract_slot, PageBinder};
pub use poll::{fibonacci, CancelToken, PollConfig, PollState, Poller, Sleeper, TokioSleeper};
pub use preview::{EcomAction, EditorEvent, PreviewSession, SessionEffect};
pub use reference::{seo_url, ReferenceResolver};
pub use revision::{Domain, RevisionSnapshot, RevisionStore};
pub use source::{HandleSource, NavigationSource, PageSource};
pub use storefront::{RouteDecision, Storefront};
