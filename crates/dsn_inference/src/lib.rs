//! Translation and summarization of the final article list.

pub mod enricher;
pub mod models;
pub mod text;

pub use enricher::{EnrichmentStats, Enricher, KillSwitch};
pub use models::{create_model, ExtractiveModel, GeminiModel};

pub mod prelude {
    pub use super::enricher::{EnrichmentStats, Enricher};
    pub use super::models::create_model;
    pub use dsn_core::{Article, Error, InferenceModel, Result};
}
