use super::queries::{
    DELETE_ENGAGEMENT_BUCKET, INCREMENT_ENGAGEMENT, SELECT_ENGAGEMENT_BUCKETS,
    SELECT_TOP_ENGAGEMENT,
};
use crate::application::ports::cache::EngagementCounterStore;
use crate::domain::entities::BucketScore;
use crate::domain::value_objects::{PostId, TimeBucket};
use crate::infrastructure::database::ConnectionPool;
use crate::shared::error::AppError;
use async_trait::async_trait;
use sqlx::Row;

/// `engagement_scores` テーブルを使うカウンター。プロセス再起動をまたいで残る。
#[derive(Clone)]
pub struct SqliteCounterStore {
    pool: ConnectionPool,
}

impl SqliteCounterStore {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

}

fn score_from_db(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[async_trait]
impl EngagementCounterStore for SqliteCounterStore {
    async fn increment(&self, bucket: TimeBucket, post_id: PostId) -> Result<u64, AppError> {
        let score: i64 = sqlx::query_scalar(INCREMENT_ENGAGEMENT)
            .bind(bucket.key())
            .bind(post_id.value())
            .fetch_one(self.pool.get_pool())
            .await?;
        Ok(score_from_db(score))
    }

    async fn drain_top(
        &self,
        bucket: TimeBucket,
        limit: usize,
    ) -> Result<Vec<BucketScore>, AppError> {
        let key = bucket.key();
        let mut tx = self.pool.get_pool().begin().await?;

        let rows = sqlx::query(SELECT_TOP_ENGAGEMENT)
            .bind(&key)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&mut *tx)
            .await?;
        sqlx::query(DELETE_ENGAGEMENT_BUCKET)
            .bind(&key)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        rows.iter()
            .map(|row| -> Result<BucketScore, AppError> {
                let post_id: i64 = row.try_get("post_id")?;
                let score: i64 = row.try_get("score")?;
                Ok(BucketScore::new(PostId::new(post_id), score_from_db(score)))
            })
            .collect()
    }

    async fn discard(&self, bucket: TimeBucket) -> Result<(), AppError> {
        sqlx::query(DELETE_ENGAGEMENT_BUCKET)
            .bind(bucket.key())
            .execute(self.pool.get_pool())
            .await?;
        Ok(())
    }

    async fn bucket_keys(&self) -> Result<Vec<TimeBucket>, AppError> {
        let keys: Vec<String> = sqlx::query_scalar(SELECT_ENGAGEMENT_BUCKETS)
            .fetch_all(self.pool.get_pool())
            .await?;

        keys.iter()
            .map(|key| TimeBucket::parse(key).map_err(AppError::DeserializationError))
            .collect()
    }
}
