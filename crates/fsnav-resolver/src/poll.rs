//! Poll-until-present for eventually consistent navigation elements.
//!
//! After content is created in the CMS, the navigation service needs a
//! moment before the new element (and its CaaS document id) shows up. The
//! [`Poller`] refetches the navigation with a fibonacci backoff until the
//! element is present and ready, giving up after a bounded number of tries.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use fsnav_core::{AppConfig, Locale, NavigationElement};

use crate::error::PollError;
use crate::navigation::NavigationCache;
use crate::revision::{Domain, RevisionStore};
use crate::source::NavigationSource;

pub const DEFAULT_MAX_TRIES: u32 = 5;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(250);

/// Delay provider for the backoff between attempts.
pub trait Sleeper: Send + Sync + 'static {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Cooperative cancellation shared between a poll and its owner.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Completes once [`CancelToken::cancel`] has been called.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub max_tries: u32,
    pub base_delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_tries: DEFAULT_MAX_TRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl PollConfig {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_tries: config.poll_max_tries.max(1),
            base_delay: Duration::from_millis(config.poll_base_delay_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Waiting { tries: u32 },
    Found(NavigationElement),
    Failed(PollError),
}

/// `fibonacci(1) == fibonacci(2) == 1`; `fibonacci(0) == 0`.
#[must_use]
pub fn fibonacci(n: u32) -> u32 {
    let (mut a, mut b) = (0u32, 1u32);
    for _ in 0..n {
        (a, b) = (b, a.saturating_add(b));
    }
    a
}

pub struct Poller<S, T = TokioSleeper> {
    navigation: Arc<NavigationCache<S>>,
    revisions: Arc<RevisionStore>,
    sleeper: T,
    config: PollConfig,
}

impl<S: NavigationSource, T: Sleeper> Poller<S, T> {
    #[must_use]
    pub fn new(
        navigation: Arc<NavigationCache<S>>,
        revisions: Arc<RevisionStore>,
        sleeper: T,
        config: PollConfig,
    ) -> Self {
        Self {
            navigation,
            revisions,
            sleeper,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> PollConfig {
        self.config
    }

    /// Waits until element `id` exists in the `locale` navigation and
    /// satisfies `ready`.
    ///
    /// Every attempt fetches a fresh tree. A failed fetch counts as a failed
    /// attempt. On success the navigation revision is bumped so cached trees
    /// pick the element up.
    ///
    /// # Errors
    ///
    /// - [`PollError::NotPresent`] after `max_tries` unsuccessful attempts.
    /// - [`PollError::Cancelled`] when `cancel` fires before success.
    pub async fn poll_until_present<P>(
        &self,
        id: &str,
        locale: &Locale,
        ready: P,
        cancel: &CancelToken,
    ) -> Result<NavigationElement, PollError>
    where
        P: Fn(&NavigationElement) -> bool + Send + Sync,
    {
        let mut state = PollState::Waiting { tries: 1 };
        loop {
            state = match state {
                PollState::Waiting { tries } => {
                    self.attempt(id, locale, &ready, cancel, tries).await
                }
                PollState::Found(element) => return Ok(element),
                PollState::Failed(err) => return Err(err),
            };
        }
    }

    async fn attempt<P>(
        &self,
        id: &str,
        locale: &Locale,
        ready: &P,
        cancel: &CancelToken,
        tries: u32,
    ) -> PollState
    where
        P: Fn(&NavigationElement) -> bool + Send + Sync,
    {
        if cancel.is_cancelled() {
            return PollState::Failed(PollError::Cancelled { id: id.to_string() });
        }

        let found = match self.navigation.fetch_fresh(locale).await {
            Ok(tree) => tree.element(id).filter(|element| ready(element)).cloned(),
            Err(e) => {
                tracing::warn!(id, tries, error = %e, "navigation fetch failed while polling");
                None
            }
        };

        if let Some(element) = found {
            self.revisions.bump(Domain::Navigation);
            tracing::info!(id, tries, "navigation element present");
            return PollState::Found(element);
        }

        if tries >= self.config.max_tries {
            tracing::warn!(id, tries, "navigation element did not appear");
            return PollState::Failed(PollError::NotPresent {
                id: id.to_string(),
                tries,
            });
        }

        let delay = self.config.base_delay * fibonacci(tries);
        tracing::debug!(id, tries, delay_ms = delay.as_millis(), "navigation element missing, backing off");
        tokio::select! {
            () = self.sleeper.sleep(delay) => PollState::Waiting { tries: tries + 1 },
            () = cancel.cancelled() => PollState::Failed(PollError::Cancelled { id: id.to_string() }),
        }
    }
}
