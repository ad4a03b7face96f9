use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const BUCKET_KEY_FORMAT: &str = "%Y-%m-%dT%H:%M";
const SECONDS_PER_MINUTE: i64 = 60;

/// ローテーション粒度（分）で切り捨てた時刻で識別されるカウンターのスコープ。
///
/// 秒以下は常に 0 に揃えられるため、同じ分に作られたバケットは同じ ID を持つ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeBucket(DateTime<Utc>);

impl TimeBucket {
    /// `at` を分単位に切り捨てたバケットを返す
    pub fn starting_at(at: DateTime<Utc>) -> Self {
        let secs = at.timestamp();
        let truncated = secs - secs.rem_euclid(SECONDS_PER_MINUTE);
        Self(DateTime::from_timestamp(truncated, 0).unwrap_or(at))
    }

    /// 直後の（1 分後の）バケット
    pub fn successor(&self) -> Self {
        Self(self.0 + Duration::minutes(1))
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.0
    }

    /// ストア上のキーとして使う文字列（例: `2026-10-16T13:00`）
    pub fn key(&self) -> String {
        self.0.format(BUCKET_KEY_FORMAT).to_string()
    }

    pub fn parse(key: &str) -> Result<Self, String> {
        NaiveDateTime::parse_from_str(key.trim(), BUCKET_KEY_FORMAT)
            .map(|naive| Self(naive.and_utc()))
            .map_err(|err| format!("Invalid bucket key '{key}': {err}"))
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// 固定のローテーション周期。境界は Unix エポックからの周期の倍数（UTC）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPeriod {
    minutes: u64,
}

impl RotationPeriod {
    pub fn from_minutes(minutes: u64) -> Self {
        Self {
            minutes: minutes.max(1),
        }
    }

    pub fn minutes(&self) -> u64 {
        self.minutes
    }

    pub fn as_duration(&self) -> Duration {
        Duration::minutes(self.minutes as i64)
    }

    /// `now` より厳密に後の最初の境界
    pub fn next_boundary_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let period_secs = self.minutes as i64 * SECONDS_PER_MINUTE;
        let secs = now.timestamp();
        let next = secs - secs.rem_euclid(period_secs) + period_secs;
        DateTime::from_timestamp(next, 0).unwrap_or(now + self.as_duration())
    }

    /// `now` 以前で最も新しい境界（`now` が境界ならそのまま）
    pub fn boundary_at_or_before(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let period_secs = self.minutes as i64 * SECONDS_PER_MINUTE;
        let secs = now.timestamp();
        DateTime::from_timestamp(secs - secs.rem_euclid(period_secs), 0).unwrap_or(now)
    }

    /// 次の境界までの待ち時間
    pub fn delay_until_next(&self, now: DateTime<Utc>) -> std::time::Duration {
        (self.next_boundary_after(now) - now)
            .to_std()
            .unwrap_or_default()
    }
}

impl Default for RotationPeriod {
    fn default() -> Self {
        Self::from_minutes(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, h, m, s).unwrap()
    }

    #[test]
    fn starting_at_zeroes_seconds_and_subseconds() {
        let now = at(13, 42, 59) + Duration::milliseconds(750);
        let bucket = TimeBucket::starting_at(now);
        assert_eq!(bucket.started_at(), at(13, 42, 0));
        assert_eq!(bucket.key(), "2026-10-16T13:42");
    }

    #[test]
    fn key_parses_back_to_same_bucket() {
        let bucket = TimeBucket::starting_at(at(9, 5, 30));
        let parsed = TimeBucket::parse(&bucket.key()).expect("parse");
        assert_eq!(parsed, bucket);
        assert!(TimeBucket::parse("yesterday").is_err());
    }

    #[test]
    fn successor_is_strictly_greater() {
        let bucket = TimeBucket::starting_at(at(23, 59, 10));
        let next = bucket.successor();
        assert!(next > bucket);
        assert_eq!(next.key(), "2026-10-17T00:00");
    }

    #[test]
    fn hourly_boundary_is_top_of_next_hour() {
        let period = RotationPeriod::from_minutes(60);
        assert_eq!(period.next_boundary_after(at(13, 42, 10)), at(14, 0, 0));
        // 境界ちょうどの場合は次の境界
        assert_eq!(period.next_boundary_after(at(14, 0, 0)), at(15, 0, 0));
    }

    #[test]
    fn sub_hour_periods_align_to_multiples() {
        let period = RotationPeriod::from_minutes(15);
        assert_eq!(period.next_boundary_after(at(13, 7, 0)), at(13, 15, 0));
        assert_eq!(
            period.delay_until_next(at(13, 14, 30)),
            std::time::Duration::from_secs(30)
        );
    }

    #[test]
    fn current_period_starts_at_previous_boundary() {
        let period = RotationPeriod::from_minutes(60);
        assert_eq!(period.boundary_at_or_before(at(12, 40, 5)), at(12, 0, 0));
        assert_eq!(period.boundary_at_or_before(at(13, 0, 0)), at(13, 0, 0));
    }

    #[test]
    fn zero_minute_period_is_clamped() {
        assert_eq!(RotationPeriod::from_minutes(0).minutes(), 1);
    }
}
