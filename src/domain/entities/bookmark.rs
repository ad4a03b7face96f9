use crate::domain::value_objects::{PostId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ユーザーによる投稿のブックマーク。`(post_id, user_id)` で一意。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub post_id: PostId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn new(post_id: PostId, user_id: UserId) -> Self {
        Self {
            post_id,
            user_id,
            created_at: Utc::now(),
        }
    }
}
