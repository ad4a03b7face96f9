pub mod config;
pub mod error;
pub mod metrics;

pub use config::{AppConfig, CounterBackend};
pub use error::{AppError, Result};
