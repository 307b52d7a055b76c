pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use cache::{AppCaches, TtlCache};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use logging::init_logger;
