use super::rotation_metrics::RotationMetricsRecorder;
use crate::application::services::RankingService;
use crate::domain::entities::RotationReport;
use crate::domain::value_objects::RotationPeriod;
use crate::shared::error::AppError;
use crate::shared::metrics::SignalCounters;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// 周期境界ごとにランキングをローテーションするジョブ
pub struct RankingRotationJob {
    ranking: Arc<RankingService>,
    period: RotationPeriod,
    timeout: Duration,
    metrics_recorder: Option<Arc<RotationMetricsRecorder>>,
    signal_counters: Option<Arc<SignalCounters>>,
}

impl RankingRotationJob {
    pub fn new(
        ranking: Arc<RankingService>,
        period: RotationPeriod,
        timeout: Duration,
        metrics_recorder: Option<Arc<RotationMetricsRecorder>>,
    ) -> Self {
        Self {
            ranking,
            period,
            timeout,
            metrics_recorder,
            signal_counters: None,
        }
    }

    /// エンゲージメントキューの件数を毎回メトリクスに反映する
    pub fn with_signal_counters(mut self, counters: Arc<SignalCounters>) -> Self {
        self.signal_counters = Some(counters);
        self
    }

    pub fn period(&self) -> RotationPeriod {
        self.period
    }

    /// ローテーションを 1 回実行する。タイムアウトした場合は公開前に打ち切られ、
    /// 直前のスナップショットが残る。
    pub async fn run_once(&self) -> Result<RotationReport, AppError> {
        let started = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.ranking.rotate()).await {
            Ok(result) => result,
            Err(elapsed) => Err(AppError::from(elapsed)),
        };
        let duration = started.elapsed();
        let duration_ms = duration.as_millis().min(u128::from(u64::MAX)) as u64;

        if let Some(recorder) = &self.metrics_recorder {
            match &result {
                Ok(report) => recorder.record_success(duration, report),
                Err(err) => recorder.record_failure(duration, err),
            }
            if let Some(counters) = &self.signal_counters {
                recorder.observe_signals(&counters.snapshot());
            }
        }

        match &result {
            Ok(report) => {
                tracing::info!(
                    target: "ranking::rotation",
                    closed_bucket = %report.closed_bucket,
                    active_bucket = %report.active_bucket,
                    drained = report.drained,
                    published = report.published,
                    hydration_gaps = report.hydration_gaps.len(),
                    discarded_stale = report.discarded_stale.is_some(),
                    duration_ms,
                    "ranking rotation completed"
                );
            }
            Err(err) => {
                tracing::warn!(
                    target: "ranking::rotation",
                    error = %err,
                    transient = err.is_transient(),
                    duration_ms,
                    "ranking rotation failed; previous snapshot stays published"
                );
            }
        }

        result
    }

    /// 次の境界まで待って `run_once` を繰り返すタスクを起動する
    pub fn spawn_schedule(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut next = self.period.next_boundary_after(Utc::now());
            tracing::info!(
                target: "ranking::rotation",
                period_minutes = self.period.minutes(),
                first_rotation = %next,
                "ranking rotation scheduled"
            );

            loop {
                let delay = (next - Utc::now()).to_std().unwrap_or_default();
                tokio::time::sleep(delay).await;

                // 失敗はログとメトリクスに残し、次の境界で再試行する
                let _ = self.run_once().await;

                // 早起きや長引いた実行で同じ境界を二度使わない
                next = self.period.next_boundary_after(next.max(Utc::now()));
            }
        })
    }
}
