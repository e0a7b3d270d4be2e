//! Feed collection: one collector per configured source, run in sequence by
//! the [`CollectorManager`].

pub mod collector;
pub mod logging;
pub mod manager;
pub mod rss;

pub use collector::Collector;
pub use logging::{init_logging, Logger};
pub use manager::{CollectionReport, CollectorManager};
pub use rss::{html_to_text, RssCollector};

pub mod prelude {
    pub use super::collector::Collector;
    pub use super::manager::CollectorManager;
    pub use dsn_core::{Article, Error, Result, SourceConfig};
}
