pub mod analytics;
pub mod config;
pub mod error;
pub mod process;
pub mod server;
pub mod store;

pub use analytics::AnalyticsEngine;
pub use error::{AnalyticsError, Result};
pub use store::DatasetStore;
