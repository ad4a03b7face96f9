pub mod category;
pub mod post_id;
pub mod time_bucket;
pub mod user_id;

pub use category::Category;
pub use post_id::PostId;
pub use time_bucket::{RotationPeriod, TimeBucket};
pub use user_id::UserId;
