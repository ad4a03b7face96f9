#![allow(dead_code)]

use funfit_lib::domain::entities::{NewUser, User};
use funfit_lib::{
    AppConfig, AppState, ConnectionPool, NewPostRequest, PostDetail, UserRepository,
};
use std::time::Duration;

pub async fn setup_state(config: AppConfig) -> AppState {
    let pool = ConnectionPool::in_memory().await.expect("in-memory sqlite");
    pool.migrate().await.expect("migrations");
    AppState::with_pool(config, pool)
        .await
        .expect("app state")
}

pub fn test_config(top_n: usize) -> AppConfig {
    let mut config = AppConfig::default();
    config.ranking.top_n = top_n;
    config.ranking.rotation_timeout_secs = 5;
    config
}

pub async fn seed_user(state: &AppState, name: &str) -> User {
    state
        .repository
        .create_user(&NewUser::new(format!("{name}@example.com"), name))
        .await
        .expect("seed user")
}

pub async fn seed_post(state: &AppState, author: &User, title: &str) -> PostDetail {
    state
        .post_service
        .create_post(
            author.id,
            NewPostRequest {
                title: title.to_string(),
                content: format!("{title} body"),
                category: "workout".to_string(),
            },
        )
        .await
        .expect("seed post")
}

/// エンゲージメントワーカーが `expected` 件を適用し終えるまで待つ
pub async fn wait_for_applied(state: &AppState, expected: u64) {
    let counters = state.engagement_queue.counters();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let snapshot = counters.snapshot();
            if snapshot.applied + snapshot.failed >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("engagement signals applied");
}
