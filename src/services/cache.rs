use crate::models::{Category, KnowledgeEntry};
use crate::services::backend::BackendError;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cache key of the knowledge-base snapshot
const SNAPSHOT_KEY: &str = "knowledge";

/// Every category and entry, as loaded at one point in time
#[derive(Debug, Clone)]
pub struct KnowledgeSnapshot {
    pub categories: Vec<Category>,
    pub entries: Vec<KnowledgeEntry>,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

impl KnowledgeSnapshot {
    pub fn new(categories: Vec<Category>, entries: Vec<KnowledgeEntry>) -> Self {
        Self {
            categories,
            entries,
            loaded_at: chrono::Utc::now(),
        }
    }
}

/// In-process cache for the knowledge-base snapshot
///
/// Matching needs the full record sets in memory. Reloading them for every
/// query is wasteful, so the last snapshot is kept for `ttl_secs` and
/// dropped whenever a category or entry is written.
///
/// `generation` is bumped by every invalidation. A load that started before
/// an invalidation must not end up in the cache.
pub struct KnowledgeCache {
    inner: moka::future::Cache<&'static str, Arc<KnowledgeSnapshot>>,
    generation: AtomicU64,
}

impl KnowledgeCache {
    pub fn new(ttl_secs: u64) -> Self {
        let inner = moka::future::CacheBuilder::new(1)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            inner,
            generation: AtomicU64::new(0),
        }
    }

    /// Return the cached snapshot, or load and cache a fresh one
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<Arc<KnowledgeSnapshot>, BackendError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<KnowledgeSnapshot, BackendError>>,
    {
        if let Some(snapshot) = self.inner.get(SNAPSHOT_KEY).await {
            tracing::trace!("Snapshot cache hit");
            return Ok(snapshot);
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let snapshot = Arc::new(load().await?);
        tracing::debug!(
            "Loaded snapshot: {} categories, {} entries",
            snapshot.categories.len(),
            snapshot.entries.len()
        );

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Snapshot went stale while loading, not caching it");
            return Ok(snapshot);
        }

        self.inner.insert(SNAPSHOT_KEY, snapshot.clone()).await;

        // An invalidation between the check and the insert
        if self.generation.load(Ordering::SeqCst) != generation {
            self.inner.invalidate(SNAPSHOT_KEY).await;
        }

        Ok(snapshot)
    }

    /// Drop the cached snapshot and any load still in flight
    pub async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.invalidate(SNAPSHOT_KEY).await;
        tracing::debug!("Invalidated knowledge snapshot");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn create_snapshot() -> KnowledgeSnapshot {
        create_named_snapshot("Drucker")
    }

    fn create_named_snapshot(name: &str) -> KnowledgeSnapshot {
        KnowledgeSnapshot::new(
            vec![Category { id: 1, name: name.to_string() }],
            vec![],
        )
    }

    #[test]
    fn test_loads_once_until_invalidated() {
        tokio_test::block_on(async {
            let cache = KnowledgeCache::new(60);
            let loads = AtomicUsize::new(0);

            for _ in 0..3 {
                let snapshot = cache
                    .get_or_load(|| async {
                        loads.fetch_add(1, Ordering::SeqCst);
                        Ok(create_snapshot())
                    })
                    .await
                    .unwrap();
                assert_eq!(snapshot.categories.len(), 1);
            }
            assert_eq!(loads.load(Ordering::SeqCst), 1);

            cache.invalidate().await;
            cache
                .get_or_load(|| async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(create_snapshot())
                })
                .await
                .unwrap();
            assert_eq!(loads.load(Ordering::SeqCst), 2);
        });
    }

    #[test]
    fn test_load_error_is_not_cached() {
        tokio_test::block_on(async {
            let cache = KnowledgeCache::new(60);

            let failed = cache
                .get_or_load(|| async { Err(BackendError::Unauthorized) })
                .await;
            assert!(failed.is_err());

            let loaded = cache.get_or_load(|| async { Ok(create_snapshot()) }).await;
            assert!(loaded.is_ok());
        });
    }

    #[tokio::test]
    async fn test_invalidate_during_load_discards_loaded_snapshot() {
        let cache = KnowledgeCache::new(60);
        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let slow_load = cache.get_or_load(move || async move {
            let _ = started_tx.send(());
            let _ = release_rx.await;
            Ok(create_named_snapshot("Alt"))
        });
        let write = async {
            let _ = started_rx.await;
            cache.invalidate().await;
            let _ = release_tx.send(());
        };

        let (loaded, ()) = tokio::join!(slow_load, write);
        assert_eq!(loaded.unwrap().categories[0].name, "Alt");

        let fresh = cache
            .get_or_load(|| async { Ok(create_named_snapshot("Neu")) })
            .await
            .unwrap();
        assert_eq!(fresh.categories[0].name, "Neu");
    }
}
