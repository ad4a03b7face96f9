use super::SqliteRepository;
use super::mapper::{count_to_u32, map_post_row, map_post_summary_row};
use super::queries::{
    DELETE_BOOKMARKS_BY_POST, DELETE_POST, INCREMENT_POST_VIEWS, INSERT_POST, SELECT_POST_BY_ID,
    SELECT_POST_PAGE,
};
use crate::application::ports::repositories::PostRepository;
use crate::domain::entities::{NewPost, PageRequest, Post, PostSlice};
use crate::domain::value_objects::PostId;
use crate::shared::error::AppError;
use async_trait::async_trait;
use sqlx::Row;

#[async_trait]
impl PostRepository for SqliteRepository {
    async fn create_post(&self, post: &NewPost) -> Result<Post, AppError> {
        let row = sqlx::query(INSERT_POST)
            .bind(post.user_id.value())
            .bind(&post.author_name)
            .bind(&post.title)
            .bind(&post.content)
            .bind(post.category.name())
            .bind(post.created_at.timestamp_millis())
            .fetch_one(self.pool.get_pool())
            .await?;

        map_post_row(&row)
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, AppError> {
        let row = sqlx::query(SELECT_POST_BY_ID)
            .bind(id.value())
            .fetch_optional(self.pool.get_pool())
            .await?;

        row.as_ref().map(map_post_row).transpose()
    }

    async fn increment_views(&self, id: PostId) -> Result<Option<u32>, AppError> {
        let row = sqlx::query(INCREMENT_POST_VIEWS)
            .bind(id.value())
            .fetch_optional(self.pool.get_pool())
            .await?;

        match row {
            Some(row) => {
                let views: i64 = row.try_get("views")?;
                Ok(Some(count_to_u32(views)))
            }
            None => Ok(None),
        }
    }

    async fn delete_post(&self, id: PostId) -> Result<bool, AppError> {
        let mut tx = self.pool.get_pool().begin().await?;

        sqlx::query(DELETE_BOOKMARKS_BY_POST)
            .bind(id.value())
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query(DELETE_POST)
            .bind(id.value())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_posts(&self, page: PageRequest) -> Result<PostSlice, AppError> {
        let rows = sqlx::query(SELECT_POST_PAGE)
            .bind(i64::from(page.size) + 1)
            .bind(page.offset() as i64)
            .fetch_all(self.pool.get_pool())
            .await?;

        let has_next = rows.len() > page.size as usize;
        let items = rows
            .iter()
            .take(page.size as usize)
            .map(map_post_summary_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PostSlice {
            items,
            page: page.page,
            size: page.size,
            has_next,
        })
    }
}
