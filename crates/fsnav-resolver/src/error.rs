use std::sync::Arc;

use thiserror::Error;

/// Type-erased upstream failure, shared by every waiter of a cached fetch.
pub type SourceError = Arc<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Error)]
pub enum NavigationError {
    #[error("failed to fetch navigation for locale {locale}: {source}")]
    Fetch {
        locale: String,
        #[source]
        source: SourceError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("navigation element {id} does not exist after {tries} tries")]
    NotPresent { id: String, tries: u32 },

    #[error("polling for navigation element {id} was cancelled")]
    Cancelled { id: String },
}

#[derive(Debug, Clone, Error)]
pub enum PageError {
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error("failed to fetch page {page}: {source}")]
    Fetch {
        page: String,
        #[source]
        source: SourceError,
    },
}
