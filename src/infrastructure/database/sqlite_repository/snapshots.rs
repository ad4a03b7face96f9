use super::queries::{SELECT_SNAPSHOT, UPSERT_SNAPSHOT};
use crate::application::ports::cache::SnapshotStore;
use crate::domain::entities::BestPostsSnapshot;
use crate::infrastructure::database::ConnectionPool;
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;

/// 公開中スナップショットを保存するキー
pub const BEST_POSTS_KEY: &str = "best_posts";

/// スナップショットを JSON 文書として 1 行に保存する
#[derive(Clone)]
pub struct SqliteSnapshotStore {
    pool: ConnectionPool,
}

impl SqliteSnapshotStore {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn publish(&self, snapshot: BestPostsSnapshot) -> Result<(), AppError> {
        let payload = serde_json::to_string(&snapshot)?;

        sqlx::query(UPSERT_SNAPSHOT)
            .bind(BEST_POSTS_KEY)
            .bind(payload)
            .bind(snapshot.published_at.timestamp_millis())
            .execute(self.pool.get_pool())
            .await?;
        Ok(())
    }

    async fn current(&self) -> Result<Option<Arc<BestPostsSnapshot>>, AppError> {
        let payload: Option<String> = sqlx::query_scalar(SELECT_SNAPSHOT)
            .bind(BEST_POSTS_KEY)
            .fetch_optional(self.pool.get_pool())
            .await?;

        payload
            .map(|payload| {
                serde_json::from_str::<BestPostsSnapshot>(&payload)
                    .map(Arc::new)
                    .map_err(|err| AppError::DeserializationError(err.to_string()))
            })
            .transpose()
    }
}
