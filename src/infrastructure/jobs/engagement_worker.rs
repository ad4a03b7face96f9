use crate::application::ports::cache::EngagementSink;
use crate::application::services::RankingService;
use crate::domain::value_objects::PostId;
use crate::shared::metrics::SignalCounters;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// 読み取り経路とランキングエンジンの間にある有界キュー。
///
/// `signal` は待たずに `try_send` し、満杯なら通知を捨てる。
/// ワーカーは 1 件ずつ `record_engagement` を呼ぶ。
pub struct EngagementQueue {
    sender: mpsc::Sender<PostId>,
    counters: Arc<SignalCounters>,
}

impl EngagementQueue {
    pub fn spawn(ranking: Arc<RankingService>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let counters = Arc::new(SignalCounters::new());
        let worker = tokio::spawn(run_worker(ranking, receiver, Arc::clone(&counters)));

        (Self { sender, counters }, worker)
    }

    pub fn counters(&self) -> Arc<SignalCounters> {
        Arc::clone(&self.counters)
    }
}

impl EngagementSink for EngagementQueue {
    fn signal(&self, post_id: PostId) {
        match self.sender.try_send(post_id) {
            Ok(()) => self.counters.record_enqueued(),
            Err(TrySendError::Full(_)) => {
                self.counters.record_dropped();
                warn!(
                    target: "ranking::engagement",
                    post_id = %post_id,
                    "engagement queue full; dropping signal"
                );
            }
            Err(TrySendError::Closed(_)) => {
                self.counters.record_dropped();
                warn!(
                    target: "ranking::engagement",
                    post_id = %post_id,
                    "engagement worker stopped; dropping signal"
                );
            }
        }
    }
}

async fn run_worker(
    ranking: Arc<RankingService>,
    mut receiver: mpsc::Receiver<PostId>,
    counters: Arc<SignalCounters>,
) {
    while let Some(post_id) = receiver.recv().await {
        match ranking.record_engagement(post_id).await {
            Ok(()) => {
                counters.record_applied();
                trace!(target: "ranking::engagement", post_id = %post_id, "signal applied");
            }
            Err(err) => {
                counters.record_failed();
                warn!(
                    target: "ranking::engagement",
                    post_id = %post_id,
                    error = %err,
                    "failed to record engagement"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::repositories::{BookmarkRepository, PostRepository};
    use crate::infrastructure::cache::{MemoryCounterStore, MemorySnapshotStore};
    use crate::infrastructure::database::{ConnectionPool, SqliteRepository};
    use std::time::Duration;

    async fn ranking(counters: Arc<MemoryCounterStore>) -> Arc<RankingService> {
        let pool = ConnectionPool::in_memory().await.expect("pool");
        pool.migrate().await.expect("migrate");
        let repository = Arc::new(SqliteRepository::new(pool));
        Arc::new(RankingService::new(
            counters,
            Arc::new(MemorySnapshotStore::new()),
            Arc::clone(&repository) as Arc<dyn PostRepository>,
            repository as Arc<dyn BookmarkRepository>,
            10,
        ))
    }

    #[tokio::test]
    async fn worker_applies_signals_to_active_bucket() {
        let store = Arc::new(MemoryCounterStore::new());
        let engine = ranking(Arc::clone(&store)).await;
        let (queue, worker) = EngagementQueue::spawn(Arc::clone(&engine), 16);
        let counters = queue.counters();

        for _ in 0..3 {
            queue.signal(PostId::new(11));
        }
        drop(queue);
        worker.await.expect("worker");

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.enqueued, 3);
        assert_eq!(snapshot.applied, 3);
        let bucket = engine.active_bucket().await;
        assert_eq!(store.score(bucket, PostId::new(11)).await, 3);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn full_queue_drops_without_blocking() {
        let engine = ranking(Arc::new(MemoryCounterStore::new())).await;
        let (queue, worker) = EngagementQueue::spawn(engine, 2);

        // current_thread ランタイムなのでワーカーはまだ動いていない
        for id in 0..5 {
            queue.signal(PostId::new(id));
        }

        let snapshot = queue.counters().snapshot();
        assert_eq!(snapshot.enqueued, 2);
        assert_eq!(snapshot.dropped, 3);
        assert!(snapshot.last_dropped_ms.is_some());

        drop(queue);
        tokio::time::timeout(Duration::from_secs(5), worker)
            .await
            .expect("worker finished")
            .expect("join");
    }
}
