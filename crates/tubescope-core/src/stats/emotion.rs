//! Emotion statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{classify_comment, Tally, Taxonomy, Verdict};
use crate::classifier::{ClassifierInitError, EmotionLexiconClassifier, LexiconSource, TextClassifier};
use crate::comment::CommentBatch;

const STATISTIC: &str = "emotion";

/// Emotion labels. `None` marks comments expressing no recognised emotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Joy,
    Anger,
    Sadness,
    Fear,
    Surprise,
    Disgust,
    None,
}

impl Taxonomy for Emotion {
    fn all() -> &'static [Self] {
        &[
            Emotion::Joy,
            Emotion::Anger,
            Emotion::Sadness,
            Emotion::Fear,
            Emotion::Surprise,
            Emotion::Disgust,
            Emotion::None,
        ]
    }

    fn as_str(&self) -> &'static str {
        match self {
            Emotion::Joy => "joy",
            Emotion::Anger => "anger",
            Emotion::Sadness => "sadness",
            Emotion::Fear => "fear",
            Emotion::Surprise => "surprise",
            Emotion::Disgust => "disgust",
            Emotion::None => "none",
        }
    }

    fn empty_text() -> Self {
        Emotion::None
    }
}

/// Emotion distribution of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionReport {
    pub counts: BTreeMap<Emotion, usize>,
    pub sample_size: usize,
    pub unclassified: usize,
}

impl EmotionReport {
    /// Labels by count, highest first. Ties keep taxonomy order.
    pub fn ranked(&self) -> Vec<(Emotion, usize)> {
        let mut ranked: Vec<_> = self.counts.iter().map(|(e, c)| (*e, *c)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// The most frequent actual emotion, if any comment expressed one.
    pub fn dominant(&self) -> Option<Emotion> {
        self.ranked()
            .into_iter()
            .find(|(emotion, count)| *emotion != Emotion::None && *count > 0)
            .map(|(emotion, _)| emotion)
    }

    /// Up to `n` expressed emotions by count, excluding `none` and zeros.
    pub fn top(&self, n: usize) -> Vec<(Emotion, usize)> {
        self.ranked()
            .into_iter()
            .filter(|(emotion, count)| *emotion != Emotion::None && *count > 0)
            .take(n)
            .collect()
    }
}

/// Classifies comments into basic emotions.
pub struct EmotionEngine {
    classifier: Box<dyn TextClassifier>,
}

impl EmotionEngine {
    /// Wraps any classifier emitting emotion labels.
    pub fn new(classifier: Box<dyn TextClassifier>) -> Self {
        Self { classifier }
    }

    /// Builds the engine around the lexicon classifier.
    pub fn from_source(source: &LexiconSource) -> Result<Self, ClassifierInitError> {
        Ok(Self::new(Box::new(EmotionLexiconClassifier::load(source)?)))
    }

    /// Classifies every comment in `batch` and counts each emotion.
    pub fn analyze(&self, batch: &CommentBatch) -> EmotionReport {
        let mut tally = Tally::<Emotion>::new();
        for comment in batch {
            match classify_comment::<Emotion>(self.classifier.as_ref(), comment, STATISTIC) {
                Verdict::Classified { label, .. } => tally.record(label),
                Verdict::Unclassified => tally.skip(),
            }
        }

        EmotionReport {
            counts: tally.counts,
            sample_size: tally.sample_size,
            unclassified: tally.unclassified,
        }
    }
}
