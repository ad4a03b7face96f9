pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use application::ports::cache::{EngagementCounterStore, EngagementSink, SnapshotStore};
pub use application::ports::repositories::{BookmarkRepository, PostRepository, UserRepository};
pub use application::services::{BookmarkToggle, NewPostRequest, PostService, RankingService};
pub use domain::entities::{
    BestPostsSnapshot, BucketRecovery, PageRequest, PostDetail, RankedPost, RotationReport,
};
pub use domain::value_objects::{Category, PostId, RotationPeriod, TimeBucket, UserId};
pub use infrastructure::database::{ConnectionPool, SqliteRepository};
pub use shared::{AppConfig, AppError, CounterBackend};
pub use state::AppState;

/// ログ設定の初期化。`RUST_LOG` があればそちらを優先する。
pub fn init_logging(json: bool) {
    use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "funfit_lib=debug,ranking=debug,info".into());

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(false)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    // テストなどで二重に初期化されても落とさない
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
