pub mod bookmark;
pub mod post;
pub mod ranking;
pub mod user;

pub use bookmark::Bookmark;
pub use post::{NewPost, PageRequest, Post, PostDetail, PostSlice, PostSummary};
pub use ranking::{
    BestPostsSnapshot, BucketRecovery, BucketScore, BucketSwap, RankedPost, RotationClock, RotationReport,
    ranking_order, select_top,
};
pub use user::{NewUser, User};
