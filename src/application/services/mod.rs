pub mod post_service;
pub mod ranking_service;

pub use post_service::{BookmarkToggle, NewPostRequest, PostService};
pub use ranking_service::RankingService;
