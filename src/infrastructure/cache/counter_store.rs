use crate::application::ports::cache::EngagementCounterStore;
use crate::domain::entities::{BucketScore, select_top};
use crate::domain::value_objects::{PostId, TimeBucket};
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// プロセス内のバケット別カウンター
#[derive(Clone, Default)]
pub struct MemoryCounterStore {
    buckets: Arc<RwLock<HashMap<TimeBucket, HashMap<PostId, u64>>>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn score(&self, bucket: TimeBucket, post_id: PostId) -> u64 {
        let buckets = self.buckets.read().await;
        buckets
            .get(&bucket)
            .and_then(|scores| scores.get(&post_id))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl EngagementCounterStore for MemoryCounterStore {
    async fn increment(&self, bucket: TimeBucket, post_id: PostId) -> Result<u64, AppError> {
        let mut buckets = self.buckets.write().await;
        let score = buckets
            .entry(bucket)
            .or_default()
            .entry(post_id)
            .or_insert(0);
        *score += 1;
        Ok(*score)
    }

    async fn drain_top(
        &self,
        bucket: TimeBucket,
        limit: usize,
    ) -> Result<Vec<BucketScore>, AppError> {
        // 取り出しと削除を同じ書き込みロックの中で行う
        let scores = {
            let mut buckets = self.buckets.write().await;
            buckets.remove(&bucket)
        };

        Ok(scores
            .map(|scores| {
                select_top(
                    scores
                        .into_iter()
                        .map(|(post_id, score)| BucketScore::new(post_id, score)),
                    limit,
                )
            })
            .unwrap_or_default())
    }

    async fn discard(&self, bucket: TimeBucket) -> Result<(), AppError> {
        let mut buckets = self.buckets.write().await;
        buckets.remove(&bucket);
        Ok(())
    }

    async fn bucket_keys(&self) -> Result<Vec<TimeBucket>, AppError> {
        let buckets = self.buckets.read().await;
        let mut keys: Vec<TimeBucket> = buckets.keys().copied().collect();
        keys.sort();
        Ok(keys)
    }
}
