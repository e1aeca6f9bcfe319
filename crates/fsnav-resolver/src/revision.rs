//! Per-domain revision counters.
//!
//! Each cached data domain has a monotonically increasing counter. Bumping a
//! counter is the only invalidation signal: caches compare the counters they
//! depend on against the values recorded when an entry was fetched.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Domain {
    Page,
    Navigation,
    ExtraMenu,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Page, Domain::Navigation, Domain::ExtraMenu];

    fn index(self) -> usize {
        match self {
            Domain::Page => 0,
            Domain::Navigation => 1,
            Domain::ExtraMenu => 2,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Page => "page",
            Domain::Navigation => "navigation",
            Domain::ExtraMenu => "extra-menu",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "page" => Ok(Domain::Page),
            "navigation" => Ok(Domain::Navigation),
            "extra-menu" => Ok(Domain::ExtraMenu),
            other => Err(format!("unknown revision domain \"{other}\"")),
        }
    }
}

/// Counter values of a set of domains at one point in time. Domains outside
/// the set are recorded as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RevisionStamp([u64; 3]);

/// Snapshot of every counter, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RevisionSnapshot {
    pub page: u64,
    pub navigation: u64,
    pub extra_menu: u64,
}

#[derive(Debug, Default)]
pub struct RevisionStore {
    counters: [AtomicU64; 3],
}

impl RevisionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter for `domain` and returns the new value.
    pub fn bump(&self, domain: Domain) -> u64 {
        let value = self.counters[domain.index()].fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(%domain, revision = value, "revision bumped");
        value
    }

    #[must_use]
    pub fn current(&self, domain: Domain) -> u64 {
        self.counters[domain.index()].load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn stamp(&self, deps: &[Domain]) -> RevisionStamp {
        let mut values = [0; 3];
        for domain in deps {
            values[domain.index()] = self.current(*domain);
        }
        RevisionStamp(values)
    }

    #[must_use]
    pub fn snapshot(&self) -> RevisionSnapshot {
        RevisionSnapshot {
            page: self.current(Domain::Page),
            navigation: self.current(Domain::Navigation),
            extra_menu: self.current(Domain::ExtraMenu),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_first_bump_yields_one() {
        let store = RevisionStore::new();
        for domain in Domain::ALL {
            assert_eq!(store.current(domain), 0);
        }
        assert_eq!(store.bump(Domain::Navigation), 1);
        assert_eq!(store.bump(Domain::Navigation), 2);
        assert_eq!(store.current(Domain::Page), 0);
    }

    #[test]
    fn stamp_only_tracks_declared_domains() {
        let store = RevisionStore::new();
        let before = store.stamp(&[Domain::Navigation]);
        store.bump(Domain::Page);
        assert_eq!(store.stamp(&[Domain::Navigation]), before);
        store.bump(Domain::Navigation);
        assert_ne!(store.stamp(&[Domain::Navigation]), before);
    }

    #[test]
    fn domain_parses_kebab_case() {
        assert_eq!("extra-menu".parse::<Domain>(), Ok(Domain::ExtraMenu));
        assert!("menu".parse::<Domain>().is_err());
        assert_eq!(Domain::ExtraMenu.to_string(), "extra-menu");
    }

    #[test]
    fn concurrent_bumps_are_not_lost() {
        let store = std::sync::Arc::new(RevisionStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store.bump(Domain::Page);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.current(Domain::Page), 800);
    }
}
