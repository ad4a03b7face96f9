use crate::domain::entities::RotationReport;
use crate::shared::error::AppError;
use crate::shared::metrics::SignalSnapshot;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry, TextEncoder,
    core::Collector,
};
use std::sync::Arc;
use std::time::Duration;

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn prometheus_err(err: prometheus::Error) -> AppError {
    AppError::Internal(err.to_string())
}

fn register<C>(registry: &Registry, collector: C) -> Result<C, AppError>
where
    C: Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(prometheus_err)?;
    Ok(collector)
}

fn int_counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, AppError> {
    register(
        registry,
        IntCounter::with_opts(Opts::new(name, help)).map_err(prometheus_err)?,
    )
}

fn int_gauge(registry: &Registry, name: &str, help: &str) -> Result<IntGauge, AppError> {
    register(
        registry,
        IntGauge::with_opts(Opts::new(name, help)).map_err(prometheus_err)?,
    )
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// ランキングのローテーションとエンゲージメントキューの Prometheus メトリクス
pub struct RotationMetricsRecorder {
    registry: Arc<Registry>,
    encoder: TextEncoder,
    runs_total: IntCounter,
    failures_total: IntCounter,
    timeouts_total: IntCounter,
    published_posts: IntGauge,
    drained_entries: IntGauge,
    hydration_gaps: IntGauge,
    stale_discards_total: IntCounter,
    last_success_ms: IntGauge,
    last_failure_ms: IntGauge,
    active_bucket_start_ms: IntGauge,
    signals_enqueued: IntGauge,
    signals_applied: IntGauge,
    signals_dropped: IntGauge,
    signals_failed: IntGauge,
    duration_seconds: Option<Histogram>,
}

impl RotationMetricsRecorder {
    pub fn new(emit_histogram: bool) -> Result<Self, AppError> {
        let registry = Registry::new_custom(Some("funfit".into()), None).map_err(prometheus_err)?;

        let runs_total = int_counter(
            &registry,
            "ranking_rotation_runs_total",
            "Total number of successful ranking rotations",
        )?;
        let failures_total = int_counter(
            &registry,
            "ranking_rotation_failures_total",
            "Total number of failed or abandoned ranking rotations",
        )?;
        let timeouts_total = int_counter(
            &registry,
            "ranking_rotation_timeouts_total",
            "Total number of ranking rotations abandoned by timeout",
        )?;
        let published_posts = int_gauge(
            &registry,
            "ranking_rotation_published_posts",
            "Number of posts in the most recently published snapshot",
        )?;
        let drained_entries = int_gauge(
            &registry,
            "ranking_rotation_drained_entries",
            "Number of ranked entries drained from the last closed bucket",
        )?;
        let hydration_gaps = int_gauge(
            &registry,
            "ranking_rotation_hydration_gaps",
            "Ranked posts skipped during the last rotation because they could not be resolved",
        )?;
        let stale_discards_total = int_counter(
            &registry,
            "ranking_rotation_stale_discards_total",
            "Buckets discarded because an earlier rotation left them undrained",
        )?;
        let last_success_ms = int_gauge(
            &registry,
            "ranking_rotation_last_success_timestamp",
            "Unix timestamp in milliseconds of the last successful rotation",
        )?;
        let last_failure_ms = int_gauge(
            &registry,
            "ranking_rotation_last_failure_timestamp",
            "Unix timestamp in milliseconds of the last failed rotation",
        )?;
        let active_bucket_start_ms = int_gauge(
            &registry,
            "ranking_active_bucket_start_ms",
            "Start (milliseconds) of the bucket currently receiving engagement",
        )?;
        let signals_enqueued = int_gauge(
            &registry,
            "engagement_signals_enqueued",
            "Engagement signals accepted by the queue",
        )?;
        let signals_applied = int_gauge(
            &registry,
            "engagement_signals_applied",
            "Engagement signals applied to the active bucket",
        )?;
        let signals_dropped = int_gauge(
            &registry,
            "engagement_signals_dropped",
            "Engagement signals dropped because the queue was full or closed",
        )?;
        let signals_failed = int_gauge(
            &registry,
            "engagement_signals_failed",
            "Engagement signals that failed to reach the counter store",
        )?;

        let duration_seconds = if emit_histogram {
            let histogram = Histogram::with_opts(
                HistogramOpts::new(
                    "ranking_rotation_duration_seconds",
                    "Observed duration of ranking rotations",
                )
                .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            )
            .map_err(prometheus_err)?;
            Some(register(&registry, histogram)?)
        } else {
            None
        };

        Ok(Self {
            registry: Arc::new(registry),
            encoder: TextEncoder::new(),
            runs_total,
            failures_total,
            timeouts_total,
            published_posts,
            drained_entries,
            hydration_gaps,
            stale_discards_total,
            last_success_ms,
            last_failure_ms,
            active_bucket_start_ms,
            signals_enqueued,
            signals_applied,
            signals_dropped,
            signals_failed,
            duration_seconds,
        })
    }

    pub fn record_success(&self, duration: Duration, report: &RotationReport) {
        self.runs_total.inc();
        self.published_posts.set(report.published as i64);
        self.drained_entries.set(report.drained as i64);
        self.hydration_gaps.set(report.hydration_gaps.len() as i64);
        if report.discarded_stale.is_some() {
            self.stale_discards_total.inc();
        }
        self.last_success_ms.set(now_millis());
        self.active_bucket_start_ms
            .set(report.active_bucket.started_at().timestamp_millis());
        self.observe_duration(duration);
    }

    pub fn record_failure(&self, duration: Duration, error: &AppError) {
        self.failures_total.inc();
        if matches!(error, AppError::Timeout(_)) {
            self.timeouts_total.inc();
        }
        self.last_failure_ms.set(now_millis());
        self.observe_duration(duration);
    }

    pub fn observe_signals(&self, snapshot: &SignalSnapshot) {
        self.signals_enqueued.set(saturating_i64(snapshot.enqueued));
        self.signals_applied.set(saturating_i64(snapshot.applied));
        self.signals_dropped.set(saturating_i64(snapshot.dropped));
        self.signals_failed.set(saturating_i64(snapshot.failed));
    }

    fn observe_duration(&self, duration: Duration) {
        if let Some(histogram) = &self.duration_seconds {
            histogram.observe(duration.as_secs_f64());
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, AppError> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        self.encoder
            .encode(&metric_families, &mut buffer)
            .map_err(prometheus_err)?;
        Ok(buffer)
    }
}
