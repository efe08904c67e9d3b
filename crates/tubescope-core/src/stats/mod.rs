//! Statistics engines.
//!
//! Each engine wraps one [`TextClassifier`], classifies every comment of a
//! batch into its own closed taxonomy and reduces the verdicts to a report.
//! Comments the classifier cannot handle are counted as unclassified and
//! never touch a category count or score.

mod derision;
mod emotion;
mod sentiment;

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use tracing::{debug, warn};

use crate::classifier::{normalize_text, TextClassifier};
use crate::comment::Comment;

pub use derision::{Derision, DerisionEngine, DerisionReport};
pub use emotion::{Emotion, EmotionEngine, EmotionReport};
pub use sentiment::{Sentiment, SentimentEngine, SentimentReport};

/// A closed set of labels an engine accepts from its classifier.
pub trait Taxonomy: Copy + Ord + Serialize + Send + Sync + 'static {
    /// Every label, in report order.
    fn all() -> &'static [Self];

    /// Wire name of the label.
    fn as_str(&self) -> &'static str;

    /// Label assigned to comments whose normalized text is empty.
    fn empty_text() -> Self;

    /// Parses a classifier label, ignoring ASCII case and surrounding space.
    fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::all()
            .iter()
            .copied()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(label))
    }
}

/// Outcome of classifying a single comment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Verdict<L> {
    Classified { label: L, score: Option<f32> },
    Unclassified,
}

/// Classifies one comment, containing every classifier failure.
pub(crate) fn classify_comment<L: Taxonomy>(
    classifier: &dyn TextClassifier,
    comment: &Comment,
    statistic: &'static str,
) -> Verdict<L> {
    let text = normalize_text(&comment.text);
    if text.is_empty() {
        return Verdict::Classified {
            label: L::empty_text(),
            score: None,
        };
    }

    let prediction = match panic::catch_unwind(AssertUnwindSafe(|| classifier.classify(&text))) {
        Ok(Ok(prediction)) => prediction,
        Ok(Err(e)) => {
            debug!(
                statistic,
                comment_id = %comment.id,
                classifier = classifier.name(),
                error = %e,
                "Comment could not be classified"
            );
            return Verdict::Unclassified;
        }
        Err(_) => {
            warn!(
                statistic,
                comment_id = %comment.id,
                classifier = classifier.name(),
                "Classifier panicked on comment"
            );
            return Verdict::Unclassified;
        }
    };

    match L::from_label(&prediction.label) {
        Some(label) => Verdict::Classified {
            label,
            score: prediction.score,
        },
        None => {
            debug!(
                statistic,
                comment_id = %comment.id,
                label = %prediction.label,
                "Classifier returned unknown label"
            );
            Verdict::Unclassified
        }
    }
}

/// Running counts for one report.
#[derive(Debug, Clone)]
pub(crate) struct Tally<L: Taxonomy> {
    pub counts: BTreeMap<L, usize>,
    pub sample_size: usize,
    pub unclassified: usize,
}

impl<L: Taxonomy> Tally<L> {
    pub fn new() -> Self {
        Self {
            counts: L::all().iter().map(|label| (*label, 0)).collect(),
            sample_size: 0,
            unclassified: 0,
        }
    }

    pub fn record(&mut self, label: L) {
        *self.counts.entry(label).or_insert(0) += 1;
        self.sample_size += 1;
    }

    pub fn skip(&mut self) {
        self.unclassified += 1;
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted classifiers shared by the engine tests.

    use std::collections::HashMap;

    use crate::classifier::{ClassifyError, Prediction, TextClassifier};

    /// Returns a fixed answer per input text.
    pub struct ScriptedClassifier {
        pub answers: HashMap<String, Result<Prediction, ClassifyError>>,
        pub fallback: Prediction,
    }

    impl ScriptedClassifier {
        pub fn always(label: &str, score: Option<f32>) -> Self {
            Self {
                answers: HashMap::new(),
                fallback: Prediction {
                    label: label.to_string(),
                    score,
                },
            }
        }

        pub fn answer(mut self, text: &str, answer: Result<Prediction, ClassifyError>) -> Self {
            self.answers.insert(text.to_string(), answer);
            self
        }
    }

    impl TextClassifier for ScriptedClassifier {
        fn classify(&self, text: &str) -> Result<Prediction, ClassifyError> {
            if text == "panic" {
                panic!("scripted panic");
            }
            self.answers
                .get(text)
                .cloned()
                .unwrap_or_else(|| Ok(self.fallback.clone()))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedClassifier;
    use super::*;
    use crate::classifier::{ClassifyError, Prediction};

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!(Sentiment::from_label("POSITIVE"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::from_label(" negative "), Some(Sentiment::Negative));
        assert_eq!(Sentiment::from_label("mixed"), None);
        assert_eq!(Emotion::from_label("None"), Some(Emotion::None));
        assert_eq!(Derision::from_label("non_derisive"), Some(Derision::NonDerisive));
    }

    #[test]
    fn empty_text_skips_classifier() {
        let classifier = ScriptedClassifier::always("bogus", None);
        let verdict: Verdict<Sentiment> =
            classify_comment(&classifier, &Comment::new("a", " <br> "), "sentiment");
        assert_eq!(
            verdict,
            Verdict::Classified {
                label: Sentiment::Neutral,
                score: None
            }
        );
    }

    #[test]
    fn failures_are_unclassified() {
        let classifier = ScriptedClassifier::always("positive", Some(1.0))
            .answer("broken", Err(ClassifyError::TimedOut))
            .answer("odd", Ok(Prediction::label("ecstatic")));

        for text in ["broken", "odd", "panic"] {
            let verdict: Verdict<Sentiment> =
                classify_comment(&classifier, &Comment::new("a", text), "sentiment");
            assert_eq!(verdict, Verdict::Unclassified, "text {text:?}");
        }
    }

    #[test]
    fn tally_starts_with_every_label() {
        let mut tally = Tally::<Derision>::new();
        tally.record(Derision::Derisive);
        tally.skip();

        assert_eq!(tally.counts.len(), 2);
        assert_eq!(tally.counts[&Derision::Derisive], 1);
        assert_eq!(tally.counts[&Derision::NonDerisive], 0);
        assert_eq!(tally.sample_size, 1);
        assert_eq!(tally.unclassified, 1);
    }
}
