use serde::{Deserialize, Serialize};

/// エンゲージメントカウンターの保存先
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CounterBackend {
    #[default]
    Memory,
    Sqlite,
}

impl CounterBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Some(Self::Memory),
            "sqlite" | "db" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub ranking: RankingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    pub top_n: usize,
    pub rotation_period_minutes: u64,
    pub rotation_timeout_secs: u64,
    pub engagement_queue_capacity: usize,
    #[serde(default)]
    pub counter_backend: CounterBackend,
    pub persist_snapshot: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    #[serde(default)]
    pub prometheus_port: Option<u16>,
    #[serde(default)]
    pub emit_histogram: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://data/funfit.db?mode=rwc".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            ranking: RankingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            rotation_period_minutes: 60, // 毎時ちょうど
            rotation_timeout_secs: 30,
            engagement_queue_capacity: 1024,
            counter_backend: CounterBackend::Memory,
            persist_snapshot: true,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prometheus_port: None,
            emit_histogram: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("FUNFIT_DATABASE_URL") {
            let v = v.trim();
            if !v.is_empty() {
                cfg.database.url = v.to_string();
            }
        }
        if let Ok(v) = std::env::var("FUNFIT_DATABASE_MAX_CONNECTIONS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.database.max_connections = value.clamp(1, u64::from(u32::MAX)) as u32;
        }

        // ランキング設定
        if let Ok(v) = std::env::var("FUNFIT_RANKING_TOP_N")
            && let Some(value) = parse_u64(&v)
        {
            cfg.ranking.top_n = value.max(1) as usize;
        }
        if let Ok(v) = std::env::var("FUNFIT_RANKING_PERIOD_MINUTES")
            && let Some(value) = parse_u64(&v)
        {
            cfg.ranking.rotation_period_minutes = value.max(1);
        }
        if let Ok(v) = std::env::var("FUNFIT_RANKING_TIMEOUT_SECS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.ranking.rotation_timeout_secs = value.max(1);
        }
        if let Ok(v) = std::env::var("FUNFIT_ENGAGEMENT_QUEUE_CAPACITY")
            && let Some(value) = parse_u64(&v)
        {
            cfg.ranking.engagement_queue_capacity = value.max(1) as usize;
        }
        if let Ok(v) = std::env::var("FUNFIT_COUNTER_BACKEND")
            && let Some(backend) = CounterBackend::parse(&v)
        {
            cfg.ranking.counter_backend = backend;
        }
        if let Ok(v) = std::env::var("FUNFIT_SNAPSHOT_PERSIST") {
            cfg.ranking.persist_snapshot = parse_bool(&v, cfg.ranking.persist_snapshot);
        }

        if let Ok(v) = std::env::var("FUNFIT_METRICS_ENABLED") {
            cfg.metrics.enabled = parse_bool(&v, cfg.metrics.enabled);
        }
        if let Ok(v) = std::env::var("FUNFIT_METRICS_PROMETHEUS_PORT")
            && let Some(value) = parse_u16(&v)
        {
            cfg.metrics.prometheus_port = if value == 0 { None } else { Some(value) };
        }
        if let Ok(v) = std::env::var("FUNFIT_METRICS_EMIT_HISTOGRAM") {
            cfg.metrics.emit_histogram = parse_bool(&v, cfg.metrics.emit_histogram);
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.url.trim().is_empty() {
            return Err("Database url must not be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.ranking.top_n == 0 {
            return Err("Ranking top_n must be greater than 0".to_string());
        }
        if self.ranking.rotation_period_minutes == 0 {
            return Err("Ranking rotation_period_minutes must be greater than 0".to_string());
        }
        if self.ranking.rotation_timeout_secs == 0 {
            return Err("Ranking rotation_timeout_secs must be greater than 0".to_string());
        }
        if self.ranking.engagement_queue_capacity == 0 {
            return Err("Ranking engagement_queue_capacity must be greater than 0".to_string());
        }
        if let Some(port) = self.metrics.prometheus_port
            && port == 0
        {
            return Err("Metrics prometheus_port must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

fn parse_u16(value: &str) -> Option<u16> {
    value.trim().parse::<u16>().ok()
}
