mod common;

use common::{seed_post, seed_user, setup_state, test_config, wait_for_applied};
use funfit_lib::infrastructure::database::sqlite_repository::SqliteCounterStore;
use funfit_lib::{AppError, CounterBackend, EngagementCounterStore, PostId, PostRepository};

#[tokio::test]
async fn detail_views_feed_the_next_published_ranking() {
    let state = setup_state(test_config(2)).await;
    let author = seed_user(&state, "author").await;
    let a = seed_post(&state, &author, "A").await;
    let b = seed_post(&state, &author, "B").await;
    let c = seed_post(&state, &author, "C").await;

    for (post, views) in [(&c, 3), (&b, 5), (&a, 5)] {
        for _ in 0..views {
            state
                .post_service
                .get_post_detail(post.post_id)
                .await
                .expect("detail");
        }
    }
    wait_for_applied(&state, 13).await;

    // ローテーション前は何も公開されていない
    assert!(state.post_service.get_best_posts().await.expect("best").is_empty());

    let report = state.rotation_job.run_once().await.expect("rotation");
    assert_eq!(report.drained, 2);

    let best = state.post_service.get_best_posts().await.expect("best");
    assert_eq!(best.post_ids(), vec![a.post_id, b.post_id]);
    assert_eq!(best.posts[0].score, 5);
    assert_eq!(best.posts[0].post.view_count, 5);
    assert!(best.is_ranked());

    // 読み取りは非破壊
    let again = state.post_service.get_best_posts().await.expect("best");
    assert_eq!(again, best);

    state.shutdown().await;
}

#[tokio::test]
async fn deleted_post_is_skipped_in_snapshot_and_not_found_on_detail() {
    let state = setup_state(test_config(10)).await;
    let author = seed_user(&state, "author").await;
    let kept = seed_post(&state, &author, "kept").await;
    let removed = seed_post(&state, &author, "removed").await;

    for _ in 0..4 {
        state
            .post_service
            .get_post_detail(removed.post_id)
            .await
            .expect("detail");
    }
    state
        .post_service
        .get_post_detail(kept.post_id)
        .await
        .expect("detail");
    wait_for_applied(&state, 5).await;

    assert!(
        state
            .repository
            .delete_post(removed.post_id)
            .await
            .expect("delete")
    );

    let enqueued_before = state.engagement_queue.counters().snapshot().enqueued;
    let err = state
        .post_service
        .get_post_detail(removed.post_id)
        .await
        .expect_err("deleted");
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(
        state.engagement_queue.counters().snapshot().enqueued,
        enqueued_before
    );

    let report = state.rotation_job.run_once().await.expect("rotation");
    assert_eq!(report.hydration_gaps, vec![removed.post_id]);

    let best = state.post_service.get_best_posts().await.expect("best");
    assert_eq!(best.post_ids(), vec![kept.post_id]);

    state.shutdown().await;
}

#[tokio::test]
async fn toggling_bookmark_twice_restores_count() {
    let state = setup_state(test_config(10)).await;
    let author = seed_user(&state, "author").await;
    let reader = seed_user(&state, "reader").await;
    let post = seed_post(&state, &author, "bench press").await;

    let before = post.bookmark_count;
    let on = state
        .post_service
        .toggle_bookmark(post.post_id, reader.id)
        .await
        .expect("toggle on");
    let off = state
        .post_service
        .toggle_bookmark(post.post_id, reader.id)
        .await
        .expect("toggle off");

    assert!(on.bookmarked);
    assert_eq!(on.post.bookmark_count, before + 1);
    assert!(!off.bookmarked);
    assert_eq!(off.post.bookmark_count, before);

    let missing = state
        .post_service
        .toggle_bookmark(PostId::new(9999), reader.id)
        .await
        .expect_err("missing post");
    assert!(matches!(missing, AppError::NotFound(_)));

    state.shutdown().await;
}

#[tokio::test]
async fn rotation_with_no_engagement_publishes_empty_list() {
    let state = setup_state(test_config(10)).await;
    let author = seed_user(&state, "author").await;
    let post = seed_post(&state, &author, "squat").await;

    state
        .post_service
        .get_post_detail(post.post_id)
        .await
        .expect("detail");
    wait_for_applied(&state, 1).await;
    state.rotation_job.run_once().await.expect("first rotation");
    assert_eq!(
        state.post_service.get_best_posts().await.expect("best").len(),
        1
    );

    state.rotation_job.run_once().await.expect("second rotation");
    let best = state.post_service.get_best_posts().await.expect("best");
    assert!(best.is_empty());
    assert!(best.bucket.is_some());

    state.shutdown().await;
}

#[tokio::test]
async fn sqlite_counters_feed_ranking_through_the_engagement_queue() {
    let mut config = test_config(2);
    config.ranking.counter_backend = CounterBackend::Sqlite;
    let state = setup_state(config).await;
    let author = seed_user(&state, "author").await;
    let a = seed_post(&state, &author, "A").await;
    let b = seed_post(&state, &author, "B").await;
    let c = seed_post(&state, &author, "C").await;

    for (post, views) in [(&a, 2), (&b, 4), (&c, 1)] {
        for _ in 0..views {
            state
                .post_service
                .get_post_detail(post.post_id)
                .await
                .expect("detail");
        }
    }
    wait_for_applied(&state, 7).await;

    let counters = SqliteCounterStore::new(state.pool.clone());
    assert_eq!(
        counters.bucket_keys().await.expect("buckets"),
        vec![state.ranking_service.active_bucket().await]
    );

    let report = state.rotation_job.run_once().await.expect("rotation");
    assert_eq!(report.drained, 2);

    let best = state.post_service.get_best_posts().await.expect("best");
    assert_eq!(best.post_ids(), vec![b.post_id, a.post_id]);
    assert_eq!(best.posts[0].score, 4);
    assert!(counters.bucket_keys().await.expect("buckets").is_empty());

    state.shutdown().await;
}
