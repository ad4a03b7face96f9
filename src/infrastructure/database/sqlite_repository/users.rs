use super::SqliteRepository;
use super::mapper::map_user_row;
use super::queries::{INSERT_USER, SELECT_USER_BY_ID};
use crate::application::ports::repositories::UserRepository;
use crate::domain::entities::{NewUser, User};
use crate::domain::value_objects::UserId;
use crate::shared::error::AppError;
use async_trait::async_trait;

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn create_user(&self, user: &NewUser) -> Result<User, AppError> {
        let row = sqlx::query(INSERT_USER)
            .bind(&user.email)
            .bind(&user.name)
            .bind(user.created_at.timestamp_millis())
            .fetch_one(self.pool.get_pool())
            .await?;

        map_user_row(&row)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, AppError> {
        let row = sqlx::query(SELECT_USER_BY_ID)
            .bind(id.value())
            .fetch_optional(self.pool.get_pool())
            .await?;

        row.as_ref().map(map_user_row).transpose()
    }
}
