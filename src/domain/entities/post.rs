use super::user::User;
use crate::domain::value_objects::{Category, PostId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub user_id: UserId,
    pub author_name: String,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub views: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn with_views(mut self, views: u32) -> Self {
        self.views = views;
        self
    }

    /// 一覧・ランキング表示用の非正規化レコード
    pub fn summary(&self, bookmark_count: u32) -> PostSummary {
        PostSummary {
            post_id: self.id,
            author_name: self.author_name.clone(),
            title: self.title.clone(),
            category: self.category,
            created_at: self.created_at,
            updated_at: self.updated_at,
            bookmark_count,
            view_count: self.views,
        }
    }

    pub fn detail(&self, bookmark_count: u32) -> PostDetail {
        PostDetail {
            post_id: self.id,
            author_name: self.author_name.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            category: self.category,
            created_at: self.created_at,
            updated_at: self.updated_at,
            bookmark_count,
            view_count: self.views,
        }
    }
}

/// 採番前の投稿
#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: UserId,
    pub author_name: String,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub created_at: DateTime<Utc>,
}

impl NewPost {
    pub fn new(author: &User, title: String, content: String, category: Category) -> Self {
        Self {
            user_id: author.id,
            author_name: author.name.clone(),
            title,
            content,
            category,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub post_id: PostId,
    pub author_name: String,
    pub title: String,
    pub category: Category,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub bookmark_count: u32,
    pub view_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub post_id: PostId,
    pub author_name: String,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub bookmark_count: u32,
    pub view_count: u32,
}

/// スライス形式のページ（総件数は数えず、次ページの有無だけを返す）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub const MAX_SIZE: u32 = 100;

    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, Self::MAX_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostSlice {
    pub items: Vec<PostSummary>,
    pub page: u32,
    pub size: u32,
    pub has_next: bool,
}
