//! Tubescope Core - comment retrieval and comment statistics.
//!
//! This crate fetches the top-level comments of a video page by page and
//! computes sentiment, emotion, and derision statistics over them.
//!
//! - [`source`]: paginated, retried, deadline-bounded comment retrieval
//! - [`classifier`]: text normalization and the bundled lexicon classifiers
//! - [`stats`]: per-statistic engines and their reports
//! - [`analysis`]: the lazily initialized facade over the engines

pub mod analysis;
pub mod classifier;
pub mod comment;
pub mod source;
pub mod stats;

pub use analysis::{
    AnalysisConfig, AnalysisError, AnalysisFacade, AnalysisSummary, EngineFactory, Statistic,
    StatisticOutcome,
};
pub use classifier::{normalize_text, LexiconSource, Prediction, TextClassifier};
pub use comment::{Comment, CommentBatch, CommentBatchBuilder};
pub use source::{CommentSourceClient, RetryPolicy, SourceConfig, SourceError, ThreadApi};
pub use stats::{
    Derision, DerisionReport, Emotion, EmotionReport, Sentiment, SentimentReport, Taxonomy,
};
