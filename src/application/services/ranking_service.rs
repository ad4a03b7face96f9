use crate::application::ports::cache::{EngagementCounterStore, SnapshotStore};
use crate::application::ports::repositories::{BookmarkRepository, PostRepository};
use crate::domain::entities::{
    BestPostsSnapshot, BucketRecovery, BucketScore, RankedPost, RotationClock, RotationReport,
};
use crate::domain::value_objects::{PostId, TimeBucket};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// 時間バケット単位でエンゲージメントを集計し、ローテーションごとに
/// ベスト投稿のスナップショットを公開するランキングエンジン。
///
/// バケットのライフサイクルとスナップショットの公開はこのサービスだけが行う。
pub struct RankingService {
    counters: Arc<dyn EngagementCounterStore>,
    snapshots: Arc<dyn SnapshotStore>,
    post_repository: Arc<dyn PostRepository>,
    bookmark_repository: Arc<dyn BookmarkRepository>,
    clock: RwLock<RotationClock>,
    top_n: usize,
}

impl RankingService {
    pub fn new(
        counters: Arc<dyn EngagementCounterStore>,
        snapshots: Arc<dyn SnapshotStore>,
        post_repository: Arc<dyn PostRepository>,
        bookmark_repository: Arc<dyn BookmarkRepository>,
        top_n: usize,
    ) -> Self {
        Self::starting_at(
            counters,
            snapshots,
            post_repository,
            bookmark_repository,
            top_n,
            Utc::now(),
        )
    }

    /// `now` を含むバケットをアクティブにした状態で生成する
    pub fn starting_at(
        counters: Arc<dyn EngagementCounterStore>,
        snapshots: Arc<dyn SnapshotStore>,
        post_repository: Arc<dyn PostRepository>,
        bookmark_repository: Arc<dyn BookmarkRepository>,
        top_n: usize,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            counters,
            snapshots,
            post_repository,
            bookmark_repository,
            clock: RwLock::new(RotationClock::new(TimeBucket::starting_at(now))),
            top_n: top_n.max(1),
        }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub async fn active_bucket(&self) -> TimeBucket {
        self.clock.read().await.active()
    }

    pub async fn closing_bucket(&self) -> Option<TimeBucket> {
        self.clock.read().await.closing()
    }

    /// アクティブバケットの `post_id` のスコアを 1 増やす。
    ///
    /// 書き込みが終わるまで時計の共有ロックを保持するので、ローテーションの
    /// 入れ替えと重なった増分は必ず旧バケットか新バケットのどちらかに入る。
    pub async fn record_engagement(&self, post_id: PostId) -> Result<(), AppError> {
        let clock = self.clock.read().await;
        let score = self.counters.increment(clock.active(), post_id).await?;
        debug!(
            target: "ranking::engagement",
            post_id = %post_id,
            bucket = %clock.active(),
            score,
            "engagement recorded"
        );
        Ok(())
    }

    /// 前回のプロセスが残したバケットを整理する。起動直後、最初の記録より前に呼ぶ。
    ///
    /// `period_start` 以降の最も新しいバケットはアクティブとして引き継ぎ、
    /// 次のローテーションで集計する。それ以外は読まずに捨てる。
    pub async fn resume_persisted_buckets(
        &self,
        period_start: DateTime<Utc>,
    ) -> Result<BucketRecovery, AppError> {
        let persisted = self.counters.bucket_keys().await?;
        let floor = TimeBucket::starting_at(period_start);

        let (resumed, active) = {
            let mut clock = self.clock.write().await;
            let candidate = persisted
                .iter()
                .copied()
                .filter(|bucket| *bucket >= floor && *bucket <= clock.active())
                .max();
            let resumed = candidate.filter(|bucket| clock.resume(*bucket));
            (resumed, clock.active())
        };

        let mut discarded = Vec::new();
        for bucket in persisted.into_iter().filter(|bucket| *bucket != active) {
            warn!(
                target: "ranking::rotation",
                bucket = %bucket,
                "discarding bucket left over from a previous run"
            );
            self.counters.discard(bucket).await?;
            discarded.push(bucket);
        }

        if let Some(bucket) = resumed {
            info!(target: "ranking::rotation", bucket = %bucket, "resumed persisted bucket");
        }
        Ok(BucketRecovery { resumed, discarded })
    }

    pub async fn rotate(&self) -> Result<RotationReport, AppError> {
        self.rotate_at(Utc::now()).await
    }

    /// バケットを入れ替え、閉じたバケットの上位 N 件を公開する。
    ///
    /// drain か publish に失敗した場合はエラーを返し、直前のスナップショットが
    /// そのまま残る。個別投稿のハイドレーション失敗はスキップする。
    pub async fn rotate_at(&self, now: DateTime<Utc>) -> Result<RotationReport, AppError> {
        let swap = {
            let mut clock = self.clock.write().await;
            clock.rotate_to(TimeBucket::starting_at(now))
        };

        if let Some(stale) = swap.stale {
            warn!(
                target: "ranking::rotation",
                bucket = %stale,
                "discarding bucket left undrained by an abandoned rotation"
            );
            if let Err(err) = self.counters.discard(stale).await {
                warn!(
                    target: "ranking::rotation",
                    bucket = %stale,
                    error = %err,
                    "failed to discard stale bucket"
                );
            }
        }

        let ranked = self.counters.drain_top(swap.closed, self.top_n).await?;
        self.clock.write().await.mark_drained(swap.closed);

        let (posts, hydration_gaps) = self.hydrate(&ranked).await;
        let snapshot = BestPostsSnapshot::new(swap.closed, now, posts);
        let published = snapshot.len();
        self.snapshots.publish(snapshot).await?;

        Ok(RotationReport {
            closed_bucket: swap.closed,
            active_bucket: swap.active,
            drained: ranked.len(),
            published,
            hydration_gaps,
            discarded_stale: swap.stale,
        })
    }

    /// 現在公開中のスナップショット。未公開、またはストアに一時的に
    /// 到達できない場合は空のリストを返す。
    pub async fn best_posts(&self) -> Result<Arc<BestPostsSnapshot>, AppError> {
        match self.snapshots.current().await {
            Ok(Some(snapshot)) => Ok(snapshot),
            Ok(None) => Ok(Arc::new(BestPostsSnapshot::empty())),
            Err(err) if err.is_transient() => {
                warn!(
                    target: "ranking::rotation",
                    error = %err,
                    "snapshot store unavailable; serving empty best posts"
                );
                Ok(Arc::new(BestPostsSnapshot::empty()))
            }
            Err(err) => Err(err),
        }
    }

    async fn hydrate(&self, ranked: &[BucketScore]) -> (Vec<RankedPost>, Vec<PostId>) {
        let results = join_all(ranked.iter().map(|entry| self.hydrate_one(*entry))).await;

        let mut posts = Vec::with_capacity(ranked.len());
        let mut gaps = Vec::new();
        for (entry, result) in ranked.iter().zip(results) {
            match result {
                Ok(post) => posts.push(post),
                Err(AppError::HydrationGap(post_id)) => {
                    warn!(
                        target: "ranking::rotation",
                        post_id = %post_id,
                        score = entry.score,
                        "ranked post no longer exists; skipping"
                    );
                    gaps.push(post_id);
                }
                Err(err) => {
                    warn!(
                        target: "ranking::rotation",
                        post_id = %entry.post_id,
                        error = %err,
                        "failed to hydrate ranked post; skipping"
                    );
                    gaps.push(entry.post_id);
                }
            }
        }

        (posts, gaps)
    }

    async fn hydrate_one(&self, entry: BucketScore) -> Result<RankedPost, AppError> {
        let post = self
            .post_repository
            .get_post(entry.post_id)
            .await?
            .ok_or(AppError::HydrationGap(entry.post_id))?;
        let bookmark_count = self
            .bookmark_repository
            .count_by_post(entry.post_id)
            .await?;

        Ok(RankedPost {
            post: post.summary(bookmark_count),
            score: entry.score,
        })
    }
}
