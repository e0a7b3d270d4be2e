pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod types;

pub use config::{AppConfig, FilterConfig, QuotaBounds, SourceConfig};
pub use error::Error;
pub use models::InferenceModel;
pub use storage::ArticleStorage;
pub use types::{Article, DailyDocument, DateSummary, SourceCategory};

pub type Result<T> = std::result::Result<T, Error>;
