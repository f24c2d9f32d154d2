//! In-memory decision cache
//!
//! Only permit decisions are stored; the presence of a live entry is the
//! whole answer. Denials are never cached so every deny is re-checked
//! against the decision point.

use crate::config::CacheExpiry;
use crate::fingerprint::Fingerprint;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::debug;

type Entries = DashMap<String, Instant>;

/// Longest TTL honoured; larger values are clamped so expiry instants stay representable
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Thread-safe TTL cache of permitted fingerprints
#[derive(Debug)]
pub struct DecisionCache {
    /// `None` when the cache was created disabled; nothing is allocated then.
    entries: Option<Arc<Entries>>,
    ttl: Duration,
    disabled: AtomicBool,
}

impl DecisionCache {
    /// Create a cache for the configured expiry
    ///
    /// Expired entries are swept every 2×TTL by a background task when a
    /// tokio runtime is available, and are always ignored on lookup.
    pub fn new(expiry: CacheExpiry) -> Self {
        match expiry.ttl() {
            Some(ttl) => Self::with_ttl(ttl),
            None => Self::disabled(),
        }
    }

    /// Create an enabled cache with an explicit TTL, clamped to `MAX_TTL`
    pub fn with_ttl(ttl: Duration) -> Self {
        let ttl = ttl.min(MAX_TTL);
        let entries = Arc::new(Entries::new());
        spawn_sweeper(Arc::downgrade(&entries), ttl * 2);
        Self {
            entries: Some(entries),
            ttl,
            disabled: AtomicBool::new(false),
        }
    }

    /// Create a pass-through cache: every lookup misses, every store is dropped
    pub fn disabled() -> Self {
        Self {
            entries: None,
            ttl: Duration::ZERO,
            disabled: AtomicBool::new(true),
        }
    }

    /// Whether a live permit entry exists for `key`
    pub fn lookup(&self, key: &Fingerprint) -> bool {
        let Some(entries) = self.live_entries() else {
            return false;
        };
        let now = Instant::now();
        let expired = match entries.get(key.as_str()) {
            Some(expires_at) if *expires_at > now => return true,
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove_if(key.as_str(), |_, expires_at| *expires_at <= now);
        }
        false
    }

    /// Record a permit decision, resetting the TTL of an existing entry
    pub fn store(&self, key: &Fingerprint) {
        let Some(entries) = self.live_entries() else {
            return;
        };
        match Instant::now().checked_add(self.ttl) {
            Some(expires_at) => {
                entries.insert(key.as_str().to_string(), expires_at);
            }
            None => debug!(fingerprint = %key, "decision expiry not representable, not cached"),
        }
    }

    /// Switch to pass-through mode for the rest of this cache's life
    pub fn disable(&self) {
        self.disabled.store(true, Ordering::Release);
        if let Some(entries) = &self.entries {
            entries.clear();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.live_entries().is_some()
    }

    /// TTL of stored entries, `None` when disabled
    pub fn ttl(&self) -> Option<Duration> {
        self.is_enabled().then_some(self.ttl)
    }

    /// Remove all expired entries
    pub fn evict_expired(&self) {
        if let Some(entries) = &self.entries {
            evict(entries);
        }
    }

    /// Number of stored entries, expired ones included until swept
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |e| e.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live_entries(&self) -> Option<&Arc<Entries>> {
        if self.disabled.load(Ordering::Acquire) {
            return None;
        }
        self.entries.as_ref()
    }
}

fn evict(entries: &Entries) {
    let now = Instant::now();
    entries.retain(|_, expires_at| *expires_at > now);
}

fn spawn_sweeper(entries: Weak<Entries>, interval: Duration) {
    if interval.is_zero() {
        return;
    }
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        debug!("no async runtime; expired decisions are only dropped on lookup");
        return;
    };
    handle.spawn(async move {
        let Some(start) = tokio::time::Instant::now().checked_add(interval) else {
            return;
        };
        let mut ticker = tokio::time::interval_at(start, interval);
        loop {
            ticker.tick().await;
            // stop once the owning cache is gone
            let Some(entries) = entries.upgrade() else {
                break;
            };
            evict(&entries);
        }
    });
}
