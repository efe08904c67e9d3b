//! Sentiment statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{classify_comment, Tally, Taxonomy, Verdict};
use crate::classifier::{
    ClassifierInitError, LexiconSource, SentimentLexiconClassifier, TextClassifier,
};
use crate::comment::CommentBatch;

const STATISTIC: &str = "sentiment";

/// Sentiment labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Score used when the classifier gives a label without a score.
    pub fn valence(&self) -> f64 {
        match self {
            Sentiment::Positive => 1.0,
            Sentiment::Neutral => 0.0,
            Sentiment::Negative => -1.0,
        }
    }
}

impl Taxonomy for Sentiment {
    fn all() -> &'static [Self] {
        &[Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative]
    }

    fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    fn empty_text() -> Self {
        Sentiment::Neutral
    }
}

/// Aggregate sentiment of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    /// Comments per label.
    pub counts: BTreeMap<Sentiment, usize>,
    /// Mean per-comment score over classified comments, in `[-1.0, 1.0]`.
    pub score: f64,
    /// Number of classified comments.
    pub sample_size: usize,
    /// Number of comments that could not be classified.
    pub unclassified: usize,
}

impl SentimentReport {
    /// True when no comment was classified and `score` carries no signal.
    pub fn is_empty(&self) -> bool {
        self.sample_size == 0
    }

    /// Count for one label.
    pub fn count(&self, sentiment: Sentiment) -> usize {
        self.counts.get(&sentiment).copied().unwrap_or(0)
    }
}

/// Classifies comments as positive, neutral or negative.
pub struct SentimentEngine {
    classifier: Box<dyn TextClassifier>,
}

impl SentimentEngine {
    /// Wraps any classifier emitting `positive` / `neutral` / `negative` labels.
    pub fn new(classifier: Box<dyn TextClassifier>) -> Self {
        Self { classifier }
    }

    /// Builds the engine around the lexicon classifier.
    pub fn from_source(source: &LexiconSource) -> Result<Self, ClassifierInitError> {
        Ok(Self::new(Box::new(SentimentLexiconClassifier::load(source)?)))
    }

    /// Classifies every comment in `batch` and aggregates the result.
    pub fn analyze(&self, batch: &CommentBatch) -> SentimentReport {
        let mut tally = Tally::<Sentiment>::new();
        let mut score_sum = 0.0f64;

        for comment in batch {
            match classify_comment::<Sentiment>(self.classifier.as_ref(), comment, STATISTIC) {
                Verdict::Classified { label, score } => {
                    let Some(score) = comment_score(label, score) else {
                        tally.skip();
                        continue;
                    };
                    score_sum += score;
                    tally.record(label);
                }
                Verdict::Unclassified => tally.skip(),
            }
        }

        let score = if tally.sample_size == 0 {
            0.0
        } else {
            (score_sum / tally.sample_size as f64).clamp(-1.0, 1.0)
        };

        SentimentReport {
            counts: tally.counts,
            score,
            sample_size: tally.sample_size,
            unclassified: tally.unclassified,
        }
    }
}

/// Signed score of one comment. `None` for a non-finite classifier score.
///
/// The label decides the sign and the classifier score the magnitude.
fn comment_score(label: Sentiment, score: Option<f32>) -> Option<f64> {
    match score {
        None => Some(label.valence()),
        Some(s) if !s.is_finite() => None,
        Some(s) => Some(label.valence() * f64::from(s.abs())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifyError, Prediction};
    use crate::comment::Comment;
    use crate::stats::testing::ScriptedClassifier;

    fn batch(texts: &[&str]) -> CommentBatch {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| Comment::new(format!("c{i}"), *text))
            .collect()
    }

    #[test]
    fn all_positive_scores_one() {
        let engine = SentimentEngine::new(Box::new(ScriptedClassifier::always("positive", Some(1.0))));
        let report = engine.analyze(&batch(&["a", "b", "c"]));

        assert_eq!(report.score, 1.0);
        assert_eq!(report.count(Sentiment::Positive), 3);
        assert_eq!(report.sample_size, 3);
        assert_eq!(report.unclassified, 0);
    }

    #[test]
    fn empty_batch_is_flagged() {
        let engine = SentimentEngine::from_source(&LexiconSource::Builtin).unwrap();
        let report = engine.analyze(&CommentBatch::empty());

        assert!(report.is_empty());
        assert_eq!(report.score, 0.0);
        assert_eq!(report.counts.values().sum::<usize>(), 0);
        assert_eq!(report.counts.len(), 3);
    }

    #[test]
    fn one_failing_comment_does_not_affect_others() {
        let classifier = ScriptedClassifier::always("positive", Some(0.5))
            .answer("bad", Err(ClassifyError::Inference("boom".to_string())))
            .answer("weird", Ok(Prediction::label("mixed")))
            .answer("nan", Ok(Prediction::new("negative", f32::NAN)));
        let engine = SentimentEngine::new(Box::new(classifier));

        let report = engine.analyze(&batch(&["ok", "bad", "weird", "panic", "nan", "fine"]));

        assert_eq!(report.count(Sentiment::Positive), 2);
        assert_eq!(report.count(Sentiment::Negative), 0);
        assert_eq!(report.sample_size, 2);
        assert_eq!(report.unclassified, 4);
        assert_eq!(report.score, 0.5);
    }

    #[test]
    fn counts_and_unclassified_cover_batch() {
        let engine = SentimentEngine::from_source(&LexiconSource::Builtin).unwrap();
        let comments = batch(&[
            "I love this, amazing work",
            "This is terrible and boring",
            "Uploaded on Tuesday",
            "",
            "not bad at all",
        ]);
        let report = engine.analyze(&comments);

        let counted: usize = report.counts.values().sum();
        assert_eq!(counted, report.sample_size);
        assert_eq!(report.sample_size + report.unclassified, comments.len());
        assert!(report.count(Sentiment::Positive) >= 1);
        assert!(report.count(Sentiment::Negative) >= 1);
        assert!((-1.0..=1.0).contains(&report.score));
    }

    #[test]
    fn label_sets_sign_and_missing_score_uses_valence() {
        let classifier = ScriptedClassifier::always("neutral", None)
            .answer("up", Ok(Prediction::label("positive")))
            .answer("down", Ok(Prediction::new("negative", 0.5)));
        let engine = SentimentEngine::new(Box::new(classifier));

        let report = engine.analyze(&batch(&["up", "down", "meh", "x"]));
        // (1.0 - 0.5 + 0 + 0) / 4
        assert_eq!(report.score, 0.125);
    }

    #[test]
    fn analysis_is_deterministic() {
        let engine = SentimentEngine::from_source(&LexiconSource::Builtin).unwrap();
        let comments = batch(&["great video", "awful audio", "first", "so good!!"]);

        let first = serde_json::to_string(&engine.analyze(&comments)).unwrap();
        let second = serde_json::to_string(&engine.analyze(&comments)).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with(r#"{"counts":{"positive":"#));
    }
}
