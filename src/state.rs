use crate::application::ports::cache::{EngagementCounterStore, EngagementSink, SnapshotStore};
use crate::application::ports::repositories::{BookmarkRepository, PostRepository, UserRepository};
use crate::application::services::{PostService, RankingService};
use crate::domain::value_objects::RotationPeriod;
use crate::infrastructure::cache::{MemoryCounterStore, MemorySnapshotStore, TieredSnapshotStore};
use crate::infrastructure::database::sqlite_repository::{SqliteCounterStore, SqliteSnapshotStore};
use crate::infrastructure::database::{ConnectionPool, SqliteRepository};
use crate::infrastructure::jobs::{
    EngagementQueue, MetricsExporter, RankingRotationJob, RotationMetricsRecorder,
};
use crate::shared::config::{AppConfig, CounterBackend};
use anyhow::Context;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// アプリケーション全体の状態を管理する構造体
pub struct AppState {
    pub config: AppConfig,
    pub pool: ConnectionPool,
    pub repository: Arc<SqliteRepository>,
    pub ranking_service: Arc<RankingService>,
    pub post_service: Arc<PostService>,
    pub engagement_queue: Arc<EngagementQueue>,
    pub rotation_job: Arc<RankingRotationJob>,
    pub metrics_recorder: Option<Arc<RotationMetricsRecorder>>,
    metrics_exporter: Option<MetricsExporter>,
    engagement_worker: JoinHandle<()>,
}

impl AppState {
    pub async fn initialize(config: AppConfig) -> anyhow::Result<Self> {
        config
            .validate()
            .map_err(|err| anyhow::anyhow!("Invalid configuration: {err}"))?;

        ensure_database_dir(&config.database.url)?;
        let pool = ConnectionPool::new(
            &config.database.url,
            config.database.max_connections,
            Duration::from_secs(config.database.connection_timeout),
        )
        .await
        .with_context(|| format!("failed to open database {}", config.database.url))?;
        pool.migrate().await.context("failed to run migrations")?;

        Self::with_pool(config, pool).await
    }

    /// マイグレーション済みのプールから各サービスを組み立てる
    pub async fn with_pool(config: AppConfig, pool: ConnectionPool) -> anyhow::Result<Self> {
        let repository = Arc::new(SqliteRepository::new(pool.clone()));

        let counters: Arc<dyn EngagementCounterStore> = match config.ranking.counter_backend {
            CounterBackend::Memory => Arc::new(MemoryCounterStore::new()),
            CounterBackend::Sqlite => Arc::new(SqliteCounterStore::new(pool.clone())),
        };
        let snapshots: Arc<dyn SnapshotStore> = if config.ranking.persist_snapshot {
            Arc::new(TieredSnapshotStore::new(Arc::new(SqliteSnapshotStore::new(
                pool.clone(),
            ))))
        } else {
            Arc::new(MemorySnapshotStore::new())
        };

        let ranking_service = Arc::new(RankingService::new(
            counters,
            snapshots,
            Arc::clone(&repository) as Arc<dyn PostRepository>,
            Arc::clone(&repository) as Arc<dyn BookmarkRepository>,
            config.ranking.top_n,
        ));

        let period = RotationPeriod::from_minutes(config.ranking.rotation_period_minutes);
        let recovery = ranking_service
            .resume_persisted_buckets(period.boundary_at_or_before(Utc::now()))
            .await
            .context("failed to recover persisted engagement buckets")?;

        let (engagement_queue, engagement_worker) = EngagementQueue::spawn(
            Arc::clone(&ranking_service),
            config.ranking.engagement_queue_capacity,
        );
        let engagement_queue = Arc::new(engagement_queue);

        let post_service = Arc::new(PostService::new(
            Arc::clone(&repository) as Arc<dyn PostRepository>,
            Arc::clone(&repository) as Arc<dyn BookmarkRepository>,
            Arc::clone(&repository) as Arc<dyn UserRepository>,
            Arc::clone(&ranking_service),
            Arc::clone(&engagement_queue) as Arc<dyn EngagementSink>,
        ));

        let metrics_recorder = if config.metrics.enabled {
            let recorder = RotationMetricsRecorder::new(config.metrics.emit_histogram)
                .context("failed to build metrics recorder")?;
            Some(Arc::new(recorder))
        } else {
            None
        };
        let metrics_exporter = match (&metrics_recorder, config.metrics.prometheus_port) {
            (Some(recorder), Some(port)) => {
                match MetricsExporter::bind(&format!("127.0.0.1:{port}")) {
                    Ok(exporter) => {
                        exporter.serve(Arc::clone(recorder), Some(engagement_queue.counters()));
                        Some(exporter)
                    }
                    Err(err) => {
                        error!(
                            target: "metrics::ranking",
                            port,
                            error = %err,
                            "metrics exporter disabled"
                        );
                        None
                    }
                }
            }
            _ => None,
        };

        let rotation_job = Arc::new(
            RankingRotationJob::new(
                Arc::clone(&ranking_service),
                period,
                Duration::from_secs(config.ranking.rotation_timeout_secs),
                metrics_recorder.clone(),
            )
            .with_signal_counters(engagement_queue.counters()),
        );

        info!(
            counter_backend = ?config.ranking.counter_backend,
            persist_snapshot = config.ranking.persist_snapshot,
            top_n = config.ranking.top_n,
            period_minutes = config.ranking.rotation_period_minutes,
            resumed_bucket = ?recovery.resumed,
            discarded_buckets = recovery.discarded.len(),
            "application state initialized"
        );

        Ok(Self {
            config,
            pool,
            repository,
            ranking_service,
            post_service,
            engagement_queue,
            rotation_job,
            metrics_recorder,
            metrics_exporter,
            engagement_worker,
        })
    }

    /// 周期境界に合わせたローテーションを開始する
    pub fn spawn_rotation_schedule(&self) -> JoinHandle<()> {
        Arc::clone(&self.rotation_job).spawn_schedule()
    }

    pub async fn shutdown(self) {
        if let Some(exporter) = &self.metrics_exporter {
            exporter.shutdown();
        }
        self.engagement_worker.abort();
        self.pool.close().await;
        info!("application state shut down");
    }
}

/// ファイル DB の親ディレクトリを作る。インメモリ DB では何もしない。
fn ensure_database_dir(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_file_path(database_url) else {
        return Ok(());
    };
    if let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create data directory {}", parent.display()))?;
    }
    Ok(())
}

fn sqlite_file_path(database_url: &str) -> Option<&str> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path == ":memory:" {
        None
    } else {
        Some(path)
    }
}
