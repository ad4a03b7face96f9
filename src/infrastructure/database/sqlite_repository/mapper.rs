use crate::domain::entities::{Post, PostSummary, User};
use crate::domain::value_objects::{Category, PostId, UserId};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use sqlx::{Row, sqlite::SqliteRow};

pub(super) fn millis_to_datetime(value: i64) -> Result<DateTime<Utc>, AppError> {
    DateTime::from_timestamp_millis(value)
        .ok_or_else(|| AppError::DeserializationError(format!("Invalid timestamp: {value}")))
}

fn parse_category(value: &str) -> Result<Category, AppError> {
    Category::find(value)
        .ok_or_else(|| AppError::DeserializationError(format!("Unknown category: {value}")))
}

pub(super) fn map_user_row(row: &SqliteRow) -> Result<User, AppError> {
    Ok(User {
        id: UserId::new(row.try_get("id")?),
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        created_at: millis_to_datetime(row.try_get("created_at")?)?,
    })
}

pub(super) fn map_post_row(row: &SqliteRow) -> Result<Post, AppError> {
    let category: String = row.try_get("category")?;
    let views: i64 = row.try_get("views")?;

    Ok(Post {
        id: PostId::new(row.try_get("id")?),
        user_id: UserId::new(row.try_get("user_id")?),
        author_name: row.try_get("author_name")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        category: parse_category(&category)?,
        views: count_to_u32(views),
        created_at: millis_to_datetime(row.try_get("created_at")?)?,
        updated_at: millis_to_datetime(row.try_get("updated_at")?)?,
    })
}

/// `bookmark_count` 列を含む一覧行
pub(super) fn map_post_summary_row(row: &SqliteRow) -> Result<PostSummary, AppError> {
    let post = map_post_row(row)?;
    let bookmark_count: i64 = row.try_get("bookmark_count")?;
    Ok(post.summary(count_to_u32(bookmark_count)))
}

pub(super) fn count_to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
