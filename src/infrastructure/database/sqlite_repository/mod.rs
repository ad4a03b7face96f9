mod bookmarks;
mod counters;
mod mapper;
mod posts;
mod queries;
mod snapshots;
mod users;

pub use counters::SqliteCounterStore;
pub use snapshots::{BEST_POSTS_KEY, SqliteSnapshotStore};

use super::ConnectionPool;

/// 投稿・ブックマーク・ユーザーの SQLite 実装
#[derive(Clone)]
pub struct SqliteRepository {
    pool: ConnectionPool,
}

impl SqliteRepository {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}
