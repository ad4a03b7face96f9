use crate::domain::entities::{
    Bookmark, NewPost, NewUser, PageRequest, Post, PostSlice, User,
};
use crate::domain::value_objects::{PostId, UserId};
use crate::shared::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create_post(&self, post: &NewPost) -> Result<Post, AppError>;
    async fn get_post(&self, id: PostId) -> Result<Option<Post>, AppError>;
    /// 閲覧数を 1 増やし、更新後の値を返す。投稿が無ければ `None`。
    async fn increment_views(&self, id: PostId) -> Result<Option<u32>, AppError>;
    /// 投稿とそのブックマークを削除する。削除した場合 `true`。
    async fn delete_post(&self, id: PostId) -> Result<bool, AppError>;
    async fn list_posts(&self, page: PageRequest) -> Result<PostSlice, AppError>;
}

#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    async fn find_bookmark(
        &self,
        post_id: PostId,
        user_id: UserId,
    ) -> Result<Option<Bookmark>, AppError>;

    async fn create_bookmark(&self, post_id: PostId, user_id: UserId)
    -> Result<Bookmark, AppError>;

    async fn delete_bookmark(&self, post_id: PostId, user_id: UserId) -> Result<bool, AppError>;

    async fn count_by_post(&self, post_id: PostId) -> Result<u32, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> Result<User, AppError>;
    async fn get_user(&self, id: UserId) -> Result<Option<User>, AppError>;
}
