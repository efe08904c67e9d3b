//! Analysis facade over the three statistics engines.
//!
//! Engines are built lazily on first use and then shared for the life of the
//! facade. A failed build is remembered: the affected statistic reports
//! [`AnalysisError::ClassificationUnavailable`] from then on while the other
//! two keep working.

use std::fmt;
use std::panic;
use std::sync::OnceLock;
use std::thread;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::classifier::{ClassifierInitError, LexiconSource};
use crate::comment::CommentBatch;
use crate::stats::{
    DerisionEngine, DerisionReport, EmotionEngine, EmotionReport, SentimentEngine,
    SentimentReport,
};

/// The statistics the facade computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Sentiment,
    Emotion,
    Derision,
}

impl Statistic {
    pub fn all() -> &'static [Statistic] {
        &[Statistic::Sentiment, Statistic::Emotion, Statistic::Derision]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Sentiment => "sentiment",
            Statistic::Emotion => "emotion",
            Statistic::Derision => "derision",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the facade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The engine for `statistic` could not be initialized.
    #[error("{statistic} classification unavailable: {reason}")]
    ClassificationUnavailable { statistic: Statistic, reason: String },
}

impl AnalysisError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::ClassificationUnavailable { .. } => "classification_unavailable",
        }
    }
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Lexicon sources for the default engines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub sentiment_lexicon: LexiconSource,
    pub emotion_lexicon: LexiconSource,
    pub derision_lexicon: LexiconSource,
}

impl AnalysisConfig {
    pub fn with_sentiment_lexicon(mut self, source: LexiconSource) -> Self {
        self.sentiment_lexicon = source;
        self
    }

    pub fn with_emotion_lexicon(mut self, source: LexiconSource) -> Self {
        self.emotion_lexicon = source;
        self
    }

    pub fn with_derision_lexicon(mut self, source: LexiconSource) -> Self {
        self.derision_lexicon = source;
        self
    }
}

/// Builds an engine on first use.
pub type EngineFactory<E> = Box<dyn Fn() -> std::result::Result<E, ClassifierInitError> + Send + Sync>;

/// One lazily built engine and the factory that builds it.
struct EngineCell<E> {
    statistic: Statistic,
    factory: EngineFactory<E>,
    engine: OnceLock<std::result::Result<E, String>>,
}

impl<E> EngineCell<E> {
    fn new(statistic: Statistic, factory: EngineFactory<E>) -> Self {
        Self {
            statistic,
            factory,
            engine: OnceLock::new(),
        }
    }

    fn get(&self) -> Result<&E> {
        self.engine
            .get_or_init(|| {
                let start = Instant::now();
                match (self.factory)() {
                    Ok(engine) => {
                        info!(
                            statistic = %self.statistic,
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "Engine initialized"
                        );
                        Ok(engine)
                    }
                    Err(e) => {
                        error!(statistic = %self.statistic, error = %e, "Engine initialization failed");
                        Err(e.to_string())
                    }
                }
            })
            .as_ref()
            .map_err(|reason| AnalysisError::ClassificationUnavailable {
                statistic: self.statistic,
                reason: reason.clone(),
            })
    }
}

/// Per-statistic outcome inside an [`AnalysisSummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatisticOutcome<R> {
    Report(R),
    Unavailable { error: String, code: &'static str },
}

impl<R> StatisticOutcome<R> {
    pub fn report(&self) -> Option<&R> {
        match self {
            StatisticOutcome::Report(report) => Some(report),
            StatisticOutcome::Unavailable { .. } => None,
        }
    }
}

impl<R> From<Result<R>> for StatisticOutcome<R> {
    fn from(result: Result<R>) -> Self {
        match result {
            Ok(report) => StatisticOutcome::Report(report),
            Err(e) => StatisticOutcome::Unavailable {
                error: e.to_string(),
                code: e.code(),
            },
        }
    }
}

/// All three statistics for one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub comment_count: usize,
    pub sentiment: StatisticOutcome<SentimentReport>,
    pub emotion: StatisticOutcome<EmotionReport>,
    pub derision: StatisticOutcome<DerisionReport>,
}

/// Entry point for computing statistics over a comment batch.
///
/// Shared by handle (`Arc<AnalysisFacade>`); every method takes `&self`.
pub struct AnalysisFacade {
    sentiment: EngineCell<SentimentEngine>,
    emotion: EngineCell<EmotionEngine>,
    derision: EngineCell<DerisionEngine>,
}

impl AnalysisFacade {
    /// Creates a facade whose engines use the lexicon classifiers.
    pub fn new(config: AnalysisConfig) -> Self {
        let AnalysisConfig {
            sentiment_lexicon,
            emotion_lexicon,
            derision_lexicon,
        } = config;

        Self::from_factories(
            Box::new(move || SentimentEngine::from_source(&sentiment_lexicon)),
            Box::new(move || EmotionEngine::from_source(&emotion_lexicon)),
            Box::new(move || DerisionEngine::from_source(&derision_lexicon)),
        )
    }

    /// Creates a facade with custom engine factories.
    pub fn from_factories(
        sentiment: EngineFactory<SentimentEngine>,
        emotion: EngineFactory<EmotionEngine>,
        derision: EngineFactory<DerisionEngine>,
    ) -> Self {
        Self {
            sentiment: EngineCell::new(Statistic::Sentiment, sentiment),
            emotion: EngineCell::new(Statistic::Emotion, emotion),
            derision: EngineCell::new(Statistic::Derision, derision),
        }
    }

    pub fn sentiment_statistics(&self, batch: &CommentBatch) -> Result<SentimentReport> {
        let report = self.sentiment.get()?.analyze(batch);
        debug!(
            statistic = %Statistic::Sentiment,
            sample_size = report.sample_size,
            unclassified = report.unclassified,
            score = report.score,
            "Sentiment computed"
        );
        Ok(report)
    }

    pub fn emotion_statistics(&self, batch: &CommentBatch) -> Result<EmotionReport> {
        let report = self.emotion.get()?.analyze(batch);
        debug!(
            statistic = %Statistic::Emotion,
            sample_size = report.sample_size,
            unclassified = report.unclassified,
            "Emotion computed"
        );
        Ok(report)
    }

    pub fn derision_statistics(&self, batch: &CommentBatch) -> Result<DerisionReport> {
        let report = self.derision.get()?.analyze(batch);
        debug!(
            statistic = %Statistic::Derision,
            sample_size = report.sample_size,
            unclassified = report.unclassified,
            ratio = report.ratio,
            "Derision computed"
        );
        Ok(report)
    }

    /// Runs the three analyses in parallel on scoped threads.
    pub fn analyze_all(&self, batch: &CommentBatch) -> AnalysisSummary {
        thread::scope(|scope| {
            let sentiment = scope.spawn(|| self.sentiment_statistics(batch));
            let emotion = scope.spawn(|| self.emotion_statistics(batch));
            let derision = scope.spawn(|| self.derision_statistics(batch));

            AnalysisSummary {
                comment_count: batch.len(),
                sentiment: join(sentiment).into(),
                emotion: join(emotion).into(),
                derision: join(derision).into(),
            }
        })
    }

    /// Builds every engine now and returns the failures.
    pub fn preload(&self) -> Vec<AnalysisError> {
        [
            self.sentiment.get().err(),
            self.emotion.get().err(),
            self.derision.get().err(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl Default for AnalysisFacade {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl fmt::Debug for AnalysisFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisFacade")
            .field("sentiment_ready", &self.sentiment.engine.get().is_some())
            .field("emotion_ready", &self.emotion.engine.get().is_some())
            .field("derision_ready", &self.derision.engine.get().is_some())
            .finish()
    }
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    match handle.join() {
        Ok(value) => value,
        Err(payload) => panic::resume_unwind(payload),
    }
}
