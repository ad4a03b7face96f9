use super::SqliteRepository;
use super::mapper::{count_to_u32, millis_to_datetime};
use super::queries::{
    COUNT_BOOKMARKS_BY_POST, DELETE_BOOKMARK, INSERT_BOOKMARK, SELECT_BOOKMARK_BY_POST_AND_USER,
};
use crate::application::ports::repositories::BookmarkRepository;
use crate::domain::entities::Bookmark;
use crate::domain::value_objects::{PostId, UserId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use sqlx::FromRow;

#[derive(Debug, FromRow)]
struct BookmarkRow {
    post_id: i64,
    user_id: i64,
    created_at: i64,
}

impl BookmarkRow {
    fn into_domain(self) -> Result<Bookmark, AppError> {
        Ok(Bookmark {
            post_id: PostId::new(self.post_id),
            user_id: UserId::new(self.user_id),
            created_at: millis_to_datetime(self.created_at)?,
        })
    }
}

#[async_trait]
impl BookmarkRepository for SqliteRepository {
    async fn find_bookmark(
        &self,
        post_id: PostId,
        user_id: UserId,
    ) -> Result<Option<Bookmark>, AppError> {
        let row = sqlx::query_as::<_, BookmarkRow>(SELECT_BOOKMARK_BY_POST_AND_USER)
            .bind(post_id.value())
            .bind(user_id.value())
            .fetch_optional(self.pool.get_pool())
            .await?;

        row.map(BookmarkRow::into_domain).transpose()
    }

    async fn create_bookmark(
        &self,
        post_id: PostId,
        user_id: UserId,
    ) -> Result<Bookmark, AppError> {
        let bookmark = Bookmark::new(post_id, user_id);

        let result = sqlx::query(INSERT_BOOKMARK)
            .bind(post_id.value())
            .bind(user_id.value())
            .bind(bookmark.created_at.timestamp_millis())
            .execute(self.pool.get_pool())
            .await?;

        // 既に存在する場合はそのレコードを返す
        if result.rows_affected() == 0 {
            return self
                .find_bookmark(post_id, user_id)
                .await?
                .ok_or_else(|| AppError::not_found("Bookmark not found"));
        }

        Ok(bookmark)
    }

    async fn delete_bookmark(&self, post_id: PostId, user_id: UserId) -> Result<bool, AppError> {
        let result = sqlx::query(DELETE_BOOKMARK)
            .bind(post_id.value())
            .bind(user_id.value())
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_by_post(&self, post_id: PostId) -> Result<u32, AppError> {
        let count: i64 = sqlx::query_scalar(COUNT_BOOKMARKS_BY_POST)
            .bind(post_id.value())
            .fetch_one(self.pool.get_pool())
            .await?;
        Ok(count_to_u32(count))
    }
}
