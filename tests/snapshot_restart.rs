mod common;

use common::{seed_post, seed_user, wait_for_applied};
use funfit_lib::infrastructure::database::sqlite_repository::SqliteCounterStore;
use funfit_lib::{AppConfig, AppState, CounterBackend, EngagementCounterStore};

fn file_config(dir: &tempfile::TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("data").join("funfit.db").display()
    );
    config.ranking.persist_snapshot = true;
    config.ranking.rotation_timeout_secs = 5;
    config.metrics.enabled = false;
    config
}

#[tokio::test]
async fn published_snapshot_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");

    let published = {
        let state = AppState::initialize(file_config(&dir))
            .await
            .expect("first start");
        let author = seed_user(&state, "author").await;
        let post = seed_post(&state, &author, "deadlift").await;

        for _ in 0..2 {
            state
                .post_service
                .get_post_detail(post.post_id)
                .await
                .expect("detail");
        }
        wait_for_applied(&state, 2).await;
        state.rotation_job.run_once().await.expect("rotation");

        let best = state.post_service.get_best_posts().await.expect("best");
        state.shutdown().await;
        best
    };
    assert_eq!(published.len(), 1);

    let restarted = AppState::initialize(file_config(&dir))
        .await
        .expect("second start");
    let best = restarted
        .post_service
        .get_best_posts()
        .await
        .expect("best after restart");
    assert_eq!(best, published);

    restarted.shutdown().await;
}

#[tokio::test]
async fn memory_only_snapshot_starts_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = file_config(&dir);
    config.ranking.persist_snapshot = false;

    let state = AppState::initialize(config.clone()).await.expect("start");
    state.rotation_job.run_once().await.expect("rotation");
    state.shutdown().await;

    let restarted = AppState::initialize(config).await.expect("restart");
    let best = restarted.post_service.get_best_posts().await.expect("best");
    assert!(best.is_empty());
    assert!(best.bucket.is_none());
    restarted.shutdown().await;
}

#[tokio::test]
async fn sqlite_counters_carry_engagement_across_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = file_config(&dir);
    config.ranking.counter_backend = CounterBackend::Sqlite;
    // 再起動が周期境界をまたがないように長い周期にする
    config.ranking.rotation_period_minutes = 24 * 60;

    let (post_id, bucket) = {
        let state = AppState::initialize(config.clone())
            .await
            .expect("first start");
        let author = seed_user(&state, "author").await;
        let post = seed_post(&state, &author, "rows").await;

        for _ in 0..5 {
            state
                .post_service
                .get_post_detail(post.post_id)
                .await
                .expect("detail");
        }
        wait_for_applied(&state, 5).await;
        let bucket = state.ranking_service.active_bucket().await;
        state.shutdown().await;
        (post.post_id, bucket)
    };

    let restarted = AppState::initialize(config).await.expect("second start");
    assert_eq!(restarted.ranking_service.active_bucket().await, bucket);

    let report = restarted.rotation_job.run_once().await.expect("rotation");
    assert_eq!(report.closed_bucket, bucket);

    let best = restarted.post_service.get_best_posts().await.expect("best");
    assert_eq!(best.post_ids(), vec![post_id]);
    assert_eq!(best.posts[0].score, 5);

    let counters = SqliteCounterStore::new(restarted.pool.clone());
    assert!(counters.bucket_keys().await.expect("buckets").is_empty());
    restarted.shutdown().await;
}
