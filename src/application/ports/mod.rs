pub mod cache;
pub mod repositories;
