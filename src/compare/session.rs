// Session-scoped cache of the first (reference) document.
//
// A user comparing one contract against several scans uploads the reference
// once; subsequent comparisons in the same session reuse its extracted text.
// The cache is a single slot: caching a document for any session replaces
// whatever was there. The boundary layer owns the cache and decides when a
// session ends.

use std::future::Future;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::extract::Extraction;

#[derive(Debug, Clone)]
struct CachedDocument {
    session: String,
    extraction: Extraction,
    cached_at: DateTime<Utc>,
}

/// Holds at most one extracted document, keyed by an opaque session id.
#[derive(Debug, Default)]
pub struct SessionCache {
    slot: Option<CachedDocument>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached document for `session`, if the slot belongs to it.
    pub fn get(&self, session: &str) -> Option<&Extraction> {
        self.slot
            .as_ref()
            .filter(|c| c.session == session)
            .map(|c| &c.extraction)
    }

    /// When the document for `session` was cached.
    pub fn cached_at(&self, session: &str) -> Option<DateTime<Utc>> {
        self.slot
            .as_ref()
            .filter(|c| c.session == session)
            .map(|c| c.cached_at)
    }

    /// Cache `extraction` for `session`, returning the displaced entry (any session).
    pub fn insert(&mut self, session: &str, extraction: Extraction) -> Option<Extraction> {
        let previous = self.slot.replace(CachedDocument {
            session: session.to_string(),
            extraction,
            cached_at: Utc::now(),
        });
        if let Some(prev) = &previous {
            if prev.session != session {
                debug!(evicted_session = %prev.session, "Session cache slot overwritten");
            }
        }
        previous.map(|c| c.extraction)
    }

    /// Drop the cached document if it belongs to `session`.
    pub fn evict(&mut self, session: &str) -> Option<Extraction> {
        if self.get(session).is_some() {
            self.slot.take().map(|c| c.extraction)
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// Return the cached reference for `session`, or run `extract` and cache
    /// its result. The lock is not held while `extract` runs, so a slow OCR
    /// pass does not block other sessions.
    pub async fn resolve<F, Fut>(cache: &Mutex<Self>, session: &str, extract: F) -> Extraction
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Extraction>,
    {
        if let Some(cached) = cache.lock().await.get(session).cloned() {
            debug!(session, filename = %cached.filename, "Reusing cached reference document");
            return cached;
        }

        let extraction = extract().await;
        cache.lock().await.insert(session, extraction.clone());
        extraction
    }
}
