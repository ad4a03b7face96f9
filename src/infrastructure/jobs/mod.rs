pub mod engagement_worker;
pub mod metrics_server;
pub mod rotation_job;
pub mod rotation_metrics;

pub use engagement_worker::EngagementQueue;
pub use metrics_server::MetricsExporter;
pub use rotation_job::RankingRotationJob;
pub use rotation_metrics::RotationMetricsRecorder;
