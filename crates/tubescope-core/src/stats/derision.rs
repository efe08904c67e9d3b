//! Derision (sarcasm) statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{classify_comment, Tally, Taxonomy, Verdict};
use crate::classifier::{ClassifierInitError, DerisionCueClassifier, LexiconSource, TextClassifier};
use crate::comment::CommentBatch;

const STATISTIC: &str = "derision";

/// Derision labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Derision {
    Derisive,
    NonDerisive,
}

impl Taxonomy for Derision {
    fn all() -> &'static [Self] {
        &[Derision::Derisive, Derision::NonDerisive]
    }

    fn as_str(&self) -> &'static str {
        match self {
            Derision::Derisive => "derisive",
            Derision::NonDerisive => "non_derisive",
        }
    }

    fn empty_text() -> Self {
        Derision::NonDerisive
    }
}

/// Share of derisive comments in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerisionReport {
    pub counts: BTreeMap<Derision, usize>,
    /// `derisive / sample_size`, or 0 for an empty sample.
    pub ratio: f64,
    pub sample_size: usize,
    pub unclassified: usize,
}

/// Classifies comments as derisive or not.
pub struct DerisionEngine {
    classifier: Box<dyn TextClassifier>,
}

impl DerisionEngine {
    /// Wraps any classifier emitting `derisive` / `non_derisive` labels.
    pub fn new(classifier: Box<dyn TextClassifier>) -> Self {
        Self { classifier }
    }

    /// Builds the engine around the cue classifier.
    pub fn from_source(source: &LexiconSource) -> Result<Self, ClassifierInitError> {
        Ok(Self::new(Box::new(DerisionCueClassifier::load(source)?)))
    }

    /// Classifies every comment in `batch` and computes the derisive share.
    ///
    /// ```
    /// use tubescope_core::stats::DerisionEngine;
    /// use tubescope_core::{Comment, CommentBatch, LexiconSource};
    ///
    /// let engine = DerisionEngine::from_source(&LexiconSource::Builtin).unwrap();
    /// let batch = CommentBatch::from_comments([
    ///     Comment::new("c1", "Yeah right, thanks for nothing"),
    ///     Comment::new("c2", "Great tutorial"),
    /// ]);
    ///
    /// let report = engine.analyze(&batch);
    /// assert_eq!(report.sample_size, 2);
    /// assert_eq!(report.ratio, 0.5);
    /// ```
    pub fn analyze(&self, batch: &CommentBatch) -> DerisionReport {
        let mut tally = Tally::<Derision>::new();
        for comment in batch {
            match classify_comment::<Derision>(self.classifier.as_ref(), comment, STATISTIC) {
                Verdict::Classified { label, .. } => tally.record(label),
                Verdict::Unclassified => tally.skip(),
            }
        }

        let derisive = tally.counts.get(&Derision::Derisive).copied().unwrap_or(0);
        let ratio = if tally.sample_size == 0 {
            0.0
        } else {
            derisive as f64 / tally.sample_size as f64
        };

        DerisionReport {
            counts: tally.counts,
            ratio,
            sample_size: tally.sample_size,
            unclassified: tally.unclassified,
        }
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
    fn ratio_over_classified_comments() {
        let engine = DerisionEngine::from_source(&LexiconSource::Builtin).unwrap();
        let report = engine.analyze(&batch(&[
            "Yeah right, best video ever /s",
            "Really helpful, thanks",
            "Thanks for nothing",
            "Clear explanation",
        ]));

        assert_eq!(report.counts[&Derision::Derisive], 2);
        assert_eq!(report.counts[&Derision::NonDerisive], 2);
        assert_eq!(report.ratio, 0.5);
    }

    #[test]
    fn empty_batch_ratio_is_zero() {
        let engine = DerisionEngine::from_source(&LexiconSource::Builtin).unwrap();
        let report = engine.analyze(&CommentBatch::empty());

        assert_eq!(report.ratio, 0.0);
        assert_eq!(report.sample_size, 0);
    }

    #[test]
    fn unclassified_comments_do_not_dilute_ratio() {
        let classifier = ScriptedClassifier::always("derisive", Some(0.9))
            .answer("err", Err(ClassifyError::Inference("offline".to_string())))
            .answer("maybe", Ok(Prediction::label("sarcastic")));
        let engine = DerisionEngine::new(Box::new(classifier));

        let report = engine.analyze(&batch(&["a", "err", "maybe", "panic"]));
        assert_eq!(report.sample_size, 1);
        assert_eq!(report.unclassified, 3);
        assert_eq!(report.ratio, 1.0);
    }

    #[test]
    fn markup_is_stripped_before_classification() {
        let engine = DerisionEngine::from_source(&LexiconSource::Builtin).unwrap();
        let report = engine.analyze(&batch(&["<b>Yeah</b>&nbsp;right"]));
        assert_eq!(report.counts[&Derision::Derisive], 1);
    }
}
