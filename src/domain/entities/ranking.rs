use super::post::PostSummary;
use crate::domain::value_objects::{PostId, TimeBucket};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::mem;

/// バケット内の 1 投稿分のスコア
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketScore {
    pub post_id: PostId,
    pub score: u64,
}

impl BucketScore {
    pub fn new(post_id: PostId, score: u64) -> Self {
        Self { post_id, score }
    }
}

/// スコア降順、同点は投稿 ID 昇順
pub fn ranking_order(a: &BucketScore, b: &BucketScore) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.post_id.cmp(&b.post_id))
}

/// スコアを並べ替えて上位 `limit` 件を返す。件数が足りなくても埋めない。
pub fn select_top(scores: impl IntoIterator<Item = BucketScore>, limit: usize) -> Vec<BucketScore> {
    let mut ranked: Vec<BucketScore> = scores.into_iter().collect();
    ranked.sort_by(ranking_order);
    ranked.truncate(limit);
    ranked
}

/// ハイドレーション時点の表示用フィールドとランキングに使ったスコア
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPost {
    #[serde(flatten)]
    pub post: PostSummary,
    pub score: u64,
}

impl RankedPost {
    pub fn post_id(&self) -> PostId {
        self.post.post_id
    }
}

/// 公開中のベスト投稿リスト
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestPostsSnapshot {
    pub bucket: Option<TimeBucket>,
    pub published_at: DateTime<Utc>,
    pub posts: Vec<RankedPost>,
}

impl BestPostsSnapshot {
    pub fn new(bucket: TimeBucket, published_at: DateTime<Utc>, posts: Vec<RankedPost>) -> Self {
        Self {
            bucket: Some(bucket),
            published_at,
            posts,
        }
    }

    /// 一度も公開されていない状態
    pub fn empty() -> Self {
        Self {
            bucket: None,
            published_at: DateTime::<Utc>::UNIX_EPOCH,
            posts: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn post_ids(&self) -> Vec<PostId> {
        self.posts.iter().map(RankedPost::post_id).collect()
    }

    /// 並び順の不変条件を満たしているか
    pub fn is_ranked(&self) -> bool {
        self.posts.windows(2).all(|pair| {
            let a = BucketScore::new(pair[0].post_id(), pair[0].score);
            let b = BucketScore::new(pair[1].post_id(), pair[1].score);
            ranking_order(&a, &b) == Ordering::Less
        })
    }
}

/// アクティブ／クローズ中のバケットの組。入れ替えは `rotate_to` の一回だけで行う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationClock {
    active: TimeBucket,
    closing: Option<TimeBucket>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketSwap {
    pub closed: TimeBucket,
    pub active: TimeBucket,
    /// 前回のローテーションで drain されずに残ったバケット
    pub stale: Option<TimeBucket>,
}

impl RotationClock {
    pub fn new(active: TimeBucket) -> Self {
        Self {
            active,
            closing: None,
        }
    }

    pub fn active(&self) -> TimeBucket {
        self.active
    }

    pub fn closing(&self) -> Option<TimeBucket> {
        self.closing
    }

    /// `candidate` を新しいアクティブバケットにする。
    /// 現在のアクティブ以下の ID は再利用せず、その次の分に進める。
    pub fn rotate_to(&mut self, candidate: TimeBucket) -> BucketSwap {
        let next = if candidate > self.active {
            candidate
        } else {
            self.active.successor()
        };
        let closed = mem::replace(&mut self.active, next);
        let stale = self.closing.replace(closed);

        BucketSwap {
            closed,
            active: next,
            stale,
        }
    }

    /// 再起動前のバケットをアクティブとして引き継ぐ。
    /// クローズ中のバケットがあるか、`bucket` が現在のアクティブより新しい場合は何もしない。
    pub fn resume(&mut self, bucket: TimeBucket) -> bool {
        if self.closing.is_some() || bucket > self.active {
            return false;
        }
        self.active = bucket;
        true
    }

    pub fn mark_drained(&mut self, bucket: TimeBucket) {
        if self.closing == Some(bucket) {
            self.closing = None;
        }
    }
}

/// 起動時に見つかった永続バケットの扱い
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketRecovery {
    pub resumed: Option<TimeBucket>,
    pub discarded: Vec<TimeBucket>,
}

/// 1 回のローテーションの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationReport {
    pub closed_bucket: TimeBucket,
    pub active_bucket: TimeBucket,
    pub drained: usize,
    pub published: usize,
    pub hydration_gaps: Vec<PostId>,
    pub discarded_stale: Option<TimeBucket>,
}
