use crate::application::ports::cache::SnapshotStore;
use crate::domain::entities::BestPostsSnapshot;
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

/// 公開中スナップショットを `Arc` ごと差し替えるメモリストア。
/// 読み手は差し替え前後どちらかの完全なリストだけを見る。
#[derive(Clone, Default)]
pub struct MemorySnapshotStore {
    current: Arc<RwLock<Option<Arc<BestPostsSnapshot>>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn replace(&self, snapshot: Arc<BestPostsSnapshot>) {
        let mut current = self.current.write().await;
        *current = Some(snapshot);
    }

    async fn clear(&self) {
        self.current.write().await.take();
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn publish(&self, snapshot: BestPostsSnapshot) -> Result<(), AppError> {
        self.replace(Arc::new(snapshot)).await;
        Ok(())
    }

    async fn current(&self) -> Result<Option<Arc<BestPostsSnapshot>>, AppError> {
        Ok(self.current.read().await.clone())
    }
}

/// メモリを前段に置いた永続スナップショットストア。
///
/// 公開は永続側が成功してからメモリに反映する。読み取りはメモリを優先し、
/// 空なら永続側から読み込んでメモリを温める。
///
/// 公開とメモリの温め直しは `gate` で直列化する。公開中はメモリを空にしておくので、
/// 公開が途中で中断されても次の読み取りは永続側の値から温め直す。
pub struct TieredSnapshotStore {
    hot: MemorySnapshotStore,
    durable: Arc<dyn SnapshotStore>,
    gate: Mutex<()>,
}

impl TieredSnapshotStore {
    pub fn new(durable: Arc<dyn SnapshotStore>) -> Self {
        Self {
            hot: MemorySnapshotStore::new(),
            durable,
            gate: Mutex::new(()),
        }
    }

    async fn load_durable(&self) -> Result<Option<Arc<BestPostsSnapshot>>, AppError> {
        self.durable.current().await.inspect_err(|err| {
            warn!(error = %err, "failed to load persisted best posts snapshot");
        })
    }
}

#[async_trait]
impl SnapshotStore for TieredSnapshotStore {
    async fn publish(&self, snapshot: BestPostsSnapshot) -> Result<(), AppError> {
        let _gate = self.gate.lock().await;
        let snapshot = Arc::new(snapshot);
        self.hot.clear().await;
        self.durable.publish(snapshot.as_ref().clone()).await?;
        self.hot.replace(snapshot).await;
        Ok(())
    }

    async fn current(&self) -> Result<Option<Arc<BestPostsSnapshot>>, AppError> {
        if let Some(snapshot) = self.hot.current().await? {
            return Ok(Some(snapshot));
        }

        // 公開中は温めずに永続側をそのまま返す
        let Ok(_gate) = self.gate.try_lock() else {
            return self.load_durable().await;
        };
        if let Some(snapshot) = self.hot.current().await? {
            return Ok(Some(snapshot));
        }

        let loaded = self.load_durable().await?;
        if let Some(snapshot) = &loaded {
            self.hot.replace(Arc::clone(snapshot)).await;
        }
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::TimeBucket;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct CountingStore {
        inner: MemorySnapshotStore,
        reads: AtomicUsize,
        fail_publish: AtomicBool,
    }

    #[async_trait]
    impl SnapshotStore for CountingStore {
        async fn publish(&self, snapshot: BestPostsSnapshot) -> Result<(), AppError> {
            if self.fail_publish.load(Ordering::SeqCst) {
                return Err(AppError::StoreUnavailable("disk full".into()));
            }
            self.inner.publish(snapshot).await
        }

        async fn current(&self) -> Result<Option<Arc<BestPostsSnapshot>>, AppError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.current().await
        }
    }

    /// 読み取りや公開の途中で止まれる永続ストア
    #[derive(Default)]
    struct PausingStore {
        inner: MemorySnapshotStore,
        pause_next_read: AtomicBool,
        hang_after_publish: AtomicBool,
        read_paused: Notify,
        resume_read: Notify,
    }

    #[async_trait]
    impl SnapshotStore for PausingStore {
        async fn publish(&self, snapshot: BestPostsSnapshot) -> Result<(), AppError> {
            self.inner.publish(snapshot).await?;
            if self.hang_after_publish.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            Ok(())
        }

        async fn current(&self) -> Result<Option<Arc<BestPostsSnapshot>>, AppError> {
            let value = self.inner.current().await?;
            if self.pause_next_read.swap(false, Ordering::SeqCst) {
                self.read_paused.notify_one();
                self.resume_read.notified().await;
            }
            Ok(value)
        }
    }

    fn snapshot_at(minute: u32) -> BestPostsSnapshot {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 12, minute, 0).unwrap();
        BestPostsSnapshot::new(TimeBucket::starting_at(at), at, Vec::new())
    }

    fn snapshot() -> BestPostsSnapshot {
        BestPostsSnapshot::new(TimeBucket::starting_at(Utc::now()), Utc::now(), Vec::new())
    }

    #[tokio::test]
    async fn memory_store_replaces_whole_snapshot() {
        let store = MemorySnapshotStore::new();
        assert!(store.current().await.unwrap().is_none());

        let first = snapshot();
        store.publish(first.clone()).await.unwrap();
        assert_eq!(store.current().await.unwrap().as_deref(), Some(&first));
    }

    #[tokio::test]
    async fn tiered_store_warms_from_durable_once() {
        let durable = Arc::new(CountingStore::default());
        durable.inner.publish(snapshot()).await.unwrap();

        let tiered = TieredSnapshotStore::new(durable.clone());
        assert!(tiered.current().await.unwrap().is_some());
        assert!(tiered.current().await.unwrap().is_some());
        assert_eq!(durable.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn tiered_publish_failure_keeps_previous_snapshot() {
        let durable = Arc::new(CountingStore::default());
        let tiered = TieredSnapshotStore::new(durable.clone());

        let first = snapshot();
        tiered.publish(first.clone()).await.unwrap();

        durable.fail_publish.store(true, Ordering::SeqCst);
        let err = tiered.publish(BestPostsSnapshot::empty()).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(tiered.current().await.unwrap().as_deref(), Some(&first));
    }

    #[tokio::test]
    async fn publish_during_cold_read_is_not_overwritten_by_warm_up() {
        let durable = Arc::new(PausingStore::default());
        durable.inner.publish(snapshot_at(0)).await.unwrap();
        durable.pause_next_read.store(true, Ordering::SeqCst);
        let tiered = Arc::new(TieredSnapshotStore::new(durable.clone()));

        let reader = tokio::spawn({
            let tiered = Arc::clone(&tiered);
            async move { tiered.current().await }
        });
        durable.read_paused.notified().await;

        let publisher = tokio::spawn({
            let tiered = Arc::clone(&tiered);
            async move { tiered.publish(snapshot_at(1)).await }
        });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        durable.resume_read.notify_one();

        let seen = reader.await.unwrap().unwrap().expect("snapshot");
        assert_eq!(seen.bucket, snapshot_at(0).bucket);
        publisher.await.unwrap().unwrap();

        let latest = tiered.current().await.unwrap().expect("snapshot");
        assert_eq!(latest.bucket, snapshot_at(1).bucket);
    }

    #[tokio::test]
    async fn cancelled_publish_is_served_from_durable_on_next_read() {
        let durable = Arc::new(PausingStore::default());
        let tiered = TieredSnapshotStore::new(durable.clone());
        tiered.publish(snapshot_at(0)).await.unwrap();

        durable.hang_after_publish.store(true, Ordering::SeqCst);
        let cancelled =
            tokio::time::timeout(Duration::from_millis(20), tiered.publish(snapshot_at(1))).await;
        assert!(cancelled.is_err());

        let latest = tiered.current().await.unwrap().expect("snapshot");
        assert_eq!(latest.bucket, snapshot_at(1).bucket);
    }
}
