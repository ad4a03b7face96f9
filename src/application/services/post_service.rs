use crate::application::ports::cache::EngagementSink;
use crate::application::ports::repositories::{BookmarkRepository, PostRepository, UserRepository};
use crate::application::services::ranking_service::RankingService;
use crate::domain::entities::{
    BestPostsSnapshot, NewPost, PageRequest, Post, PostDetail, PostSlice,
};
use crate::domain::value_objects::{Category, PostId, UserId};
use crate::shared::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// 投稿作成リクエスト。カテゴリは名前で受け取る。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPostRequest {
    pub title: String,
    pub content: String,
    pub category: String,
}

/// ブックマーク切り替え後の投稿と状態
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookmarkToggle {
    pub post: PostDetail,
    pub bookmarked: bool,
}

pub struct PostService {
    post_repository: Arc<dyn PostRepository>,
    bookmark_repository: Arc<dyn BookmarkRepository>,
    user_repository: Arc<dyn UserRepository>,
    ranking: Arc<RankingService>,
    engagement: Arc<dyn EngagementSink>,
}

impl PostService {
    pub fn new(
        post_repository: Arc<dyn PostRepository>,
        bookmark_repository: Arc<dyn BookmarkRepository>,
        user_repository: Arc<dyn UserRepository>,
        ranking: Arc<RankingService>,
        engagement: Arc<dyn EngagementSink>,
    ) -> Self {
        Self {
            post_repository,
            bookmark_repository,
            user_repository,
            ranking,
            engagement,
        }
    }

    /// 直近に公開されたベスト投稿。ローテーションを待たない。
    pub async fn get_best_posts(&self) -> Result<Arc<BestPostsSnapshot>, AppError> {
        self.ranking.best_posts().await
    }

    /// 投稿詳細を返し、閲覧数を 1 増やしてエンゲージメントを通知する。
    /// 通知は投げっぱなしで、失敗しても読み取りは成功する。
    pub async fn get_post_detail(&self, post_id: PostId) -> Result<PostDetail, AppError> {
        let post = self.require_post(post_id).await?;

        let views = self
            .post_repository
            .increment_views(post_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Post {post_id}")))?;
        self.engagement.signal(post_id);

        let bookmark_count = self.bookmark_repository.count_by_post(post_id).await?;
        Ok(post.with_views(views).detail(bookmark_count))
    }

    pub async fn toggle_bookmark(
        &self,
        post_id: PostId,
        user_id: UserId,
    ) -> Result<BookmarkToggle, AppError> {
        let post = self.require_post(post_id).await?;
        if self.user_repository.get_user(user_id).await?.is_none() {
            return Err(AppError::not_found(format!("User {user_id}")));
        }

        let bookmarked = match self
            .bookmark_repository
            .find_bookmark(post_id, user_id)
            .await?
        {
            Some(_) => {
                self.bookmark_repository
                    .delete_bookmark(post_id, user_id)
                    .await?;
                false
            }
            None => {
                self.bookmark_repository
                    .create_bookmark(post_id, user_id)
                    .await?;
                true
            }
        };
        debug!(post_id = %post_id, user_id = %user_id, bookmarked, "bookmark toggled");

        let bookmark_count = self.bookmark_repository.count_by_post(post_id).await?;
        Ok(BookmarkToggle {
            post: post.detail(bookmark_count),
            bookmarked,
        })
    }

    pub async fn create_post(
        &self,
        user_id: UserId,
        request: NewPostRequest,
    ) -> Result<PostDetail, AppError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(AppError::InvalidInput("title must not be blank".to_string()));
        }
        if request.content.trim().is_empty() {
            return Err(AppError::InvalidInput("content must not be blank".to_string()));
        }
        let category = Category::find(&request.category).ok_or_else(|| {
            AppError::InvalidInput(format!("Unknown category: {}", request.category))
        })?;

        let author = self
            .user_repository
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id}")))?;

        let new_post = NewPost::new(&author, title.to_string(), request.content, category);
        let post = self.post_repository.create_post(&new_post).await?;
        debug!(post_id = %post.id, user_id = %user_id, "post created");

        Ok(post.detail(0))
    }

    pub async fn list_posts(&self, page: PageRequest) -> Result<PostSlice, AppError> {
        self.post_repository.list_posts(page).await
    }

    async fn require_post(&self, post_id: PostId) -> Result<Post, AppError> {
        self.post_repository
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Post {post_id}")))
    }
}
