use crate::domain::entities::{BestPostsSnapshot, BucketScore};
use crate::domain::value_objects::{PostId, TimeBucket};
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;

/// (バケット, 投稿) ごとのエンゲージメントカウンター
#[async_trait]
pub trait EngagementCounterStore: Send + Sync {
    /// スコアを 1 増やし、増加後の値を返す
    async fn increment(&self, bucket: TimeBucket, post_id: PostId) -> Result<u64, AppError>;

    /// 上位 `limit` 件を読み出し、同じ操作の中でバケットごと削除する
    async fn drain_top(&self, bucket: TimeBucket, limit: usize)
    -> Result<Vec<BucketScore>, AppError>;

    /// 読まずにバケットを捨てる
    async fn discard(&self, bucket: TimeBucket) -> Result<(), AppError>;

    /// カウンターが残っているバケットを昇順で返す
    async fn bucket_keys(&self) -> Result<Vec<TimeBucket>, AppError>;
}

/// 公開中のベスト投稿スナップショット（常に 1 つ）
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// 既存のスナップショットを丸ごと差し替える
    async fn publish(&self, snapshot: BestPostsSnapshot) -> Result<(), AppError>;

    /// 未公開なら `None`
    async fn current(&self) -> Result<Option<Arc<BestPostsSnapshot>>, AppError>;
}

/// 読み取り経路からのエンゲージメント通知。呼び出し側をブロックしない。
pub trait EngagementSink: Send + Sync {
    fn signal(&self, post_id: PostId);
}
