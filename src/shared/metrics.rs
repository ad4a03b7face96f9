use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub const UNSET_TS: u64 = 0;

/// エンゲージメント通知キューの処理件数
#[derive(Debug)]
pub struct SignalCounters {
    enqueued: AtomicU64,
    applied: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
    last_applied_ms: AtomicU64,
    last_dropped_ms: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalSnapshot {
    pub enqueued: u64,
    pub applied: u64,
    pub dropped: u64,
    pub failed: u64,
    pub last_applied_ms: Option<u64>,
    pub last_dropped_ms: Option<u64>,
}

impl SignalCounters {
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            applied: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            last_applied_ms: AtomicU64::new(UNSET_TS),
            last_dropped_ms: AtomicU64::new(UNSET_TS),
        }
    }

    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_applied(&self) {
        self.applied.fetch_add(1, Ordering::Relaxed);
        self.last_applied_ms
            .store(current_unix_ms(), Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        self.last_dropped_ms
            .store(current_unix_ms(), Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SignalSnapshot {
        SignalSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            applied: self.applied.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            last_applied_ms: timestamp_to_option(self.last_applied_ms.load(Ordering::Relaxed)),
            last_dropped_ms: timestamp_to_option(self.last_dropped_ms.load(Ordering::Relaxed)),
        }
    }
}

impl Default for SignalCounters {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
pub fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(UNSET_TS)
}

#[inline]
pub fn timestamp_to_option(value: u64) -> Option<u64> {
    if value == UNSET_TS { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_events() {
        let counters = SignalCounters::new();
        assert_eq!(counters.snapshot().last_applied_ms, None);

        counters.record_enqueued();
        counters.record_enqueued();
        counters.record_applied();
        counters.record_dropped();

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.enqueued, 2);
        assert_eq!(snapshot.applied, 1);
        assert_eq!(snapshot.dropped, 1);
        assert_eq!(snapshot.failed, 0);
        assert!(snapshot.last_applied_ms.is_some());
        assert!(snapshot.last_dropped_ms.is_some());
    }
}
