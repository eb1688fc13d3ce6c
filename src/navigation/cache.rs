// Cached Navigation Service - root-level navigation cache decorator
// Wraps any NavigationService; the first build for a root topic is shared by
// every later caller for the lifetime of the cache.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, instrument};

use crate::core::strong_types::TopicId;
use crate::core::topic::Topic;
use crate::error::AppResult;
use crate::navigation::builder::NavigationService;
use crate::navigation::node::NavigationNode;

type Slot = Arc<OnceCell<Option<Arc<NavigationNode>>>>;

#[derive(Debug, Default)]
pub struct CacheMetrics {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
}

impl CacheMetrics {
    /// Fraction of lookups served from the cache, or 0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let total = hits + self.misses.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

/// Entries are never evicted; `clear` is the only invalidation path.
pub struct CachedNavigationService {
    inner: Arc<dyn NavigationService>,
    entries: Mutex<HashMap<TopicId, Slot>>,
    metrics: CacheMetrics,
}

impl CachedNavigationService {
    pub fn new(inner: Arc<dyn NavigationService>) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
            metrics: CacheMetrics::default(),
        }
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    /// Number of roots with a completed navigation tree.
    pub async fn len(&self) -> usize {
        self.entries
            .lock()
            .await
            .values()
            .filter(|slot| matches!(slot.get(), Some(Some(_))))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.lock().await;
        let count = entries.len();
        entries.clear();
        info!("Cleared {} cached navigation roots", count);
    }

    async fn slot(&self, id: TopicId) -> Slot {
        let mut entries = self.entries.lock().await;
        Arc::clone(entries.entry(id).or_default())
    }
}

#[async_trait]
impl NavigationService for CachedNavigationService {
    #[instrument(skip(self, topic), fields(topic = ?topic.as_ref().map(|t| t.id())))]
    async fn build_root(
        &self,
        topic: Option<Topic>,
        allow_page_groups: bool,
        tiers: i32,
    ) -> AppResult<Option<Arc<NavigationNode>>> {
        let Some(topic) = topic else {
            return self.inner.build_root(None, allow_page_groups, tiers).await;
        };

        let id = topic.id();
        let slot = self.slot(id).await;
        if let Some(node) = slot.get() {
            self.metrics.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Navigation cache hit for topic {}", id);
            return Ok(node.clone());
        }

        // Callers racing on the same slot wait for one build; a failed build
        // leaves the slot empty for the next caller.
        let node = slot
            .get_or_try_init(|| async {
                self.metrics.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Navigation cache miss for topic {}", id);
                self.inner
                    .build_root(Some(topic), allow_page_groups, tiers)
                    .await
            })
            .await?;
        Ok(node.clone())
    }
}
