//! Scoring and filtering of a raw article batch.
//!
//! The stages run in a fixed order: recency, topic keywords, score
//! threshold, deduplication and per-category quota allocation. Every stage is
//! synchronous and pure; the [`Pipeline`] wires them together.

pub mod dedup;
pub mod pipeline;
pub mod quota;
pub mod recency;
pub mod scorer;
pub mod topic;

pub use dedup::Deduplicator;
pub use pipeline::{FilterRun, Pipeline, PipelineReport, RunStatus, ScoreStats, Stage};
pub use quota::{Allocation, QuotaAllocator};
pub use recency::{is_recent, parse_published, Recency, RecencyFilter, TimestampError};
pub use scorer::{ScoreBreakdown, Scorer};
pub use topic::{passes_topic_filter, KeywordGate, TopicVerdict};

pub mod prelude {
    pub use super::{Pipeline, FilterRun, RunStatus};
    pub use dsn_core::{Article, FilterConfig, SourceCategory};
}
