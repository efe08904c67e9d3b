//! Regex cue classifier for derisive or sarcastic comments.
//!
//! Each cue is a pattern with a weight. A comment's score is the sum of the
//! weights of the cues it matches, capped at 1.0, and the comment is
//! labelled `derisive` when the score reaches the lexicon threshold.

use regex::RegexSet;
use serde::{Deserialize, Serialize};

use super::lexicon::{load_json, LexiconSource};
use super::{
    check_input_len, ClassifierInitError, ClassifyError, Prediction, TextClassifier,
    DEFAULT_MAX_INPUT_CHARS,
};

const DERISIVE: &str = "derisive";
const NON_DERISIVE: &str = "non_derisive";

/// One derision cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerisionCue {
    /// Regex matched against the lowercased text.
    pub pattern: String,
    /// Contribution to the score when the cue matches.
    pub weight: f32,
}

impl DerisionCue {
    /// Creates a cue from a regex pattern and its weight.
    pub fn new(pattern: impl Into<String>, weight: f32) -> Self {
        Self {
            pattern: pattern.into(),
            weight,
        }
    }
}

fn default_threshold() -> f32 {
    0.5
}

/// Weighted derision cues plus the decision threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerisionLexicon {
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    pub cues: Vec<DerisionCue>,
}

impl DerisionLexicon {
    /// Returns the bundled cue list.
    pub fn builtin() -> Self {
        let cues = BUILTIN_CUES
            .iter()
            .map(|(pattern, weight)| DerisionCue::new(*pattern, *weight))
            .collect();
        Self {
            threshold: default_threshold(),
            cues,
        }
    }

    fn validate(&self, source: &LexiconSource) -> Result<(), ClassifierInitError> {
        let invalid = |reason: String| ClassifierInitError::InvalidResource {
            source_name: source.describe(),
            reason,
        };

        if self.cues.is_empty() {
            return Err(invalid("lexicon has no cues".to_string()));
        }
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(invalid(format!(
                "threshold {} must be in (0, 1]",
                self.threshold
            )));
        }
        if let Some(cue) = self
            .cues
            .iter()
            .find(|c| !c.weight.is_finite() || c.weight <= 0.0)
        {
            return Err(invalid(format!(
                "cue {:?} has non-positive weight {}",
                cue.pattern, cue.weight
            )));
        }
        Ok(())
    }
}

// Patterns run on lowercased, normalized text.
const BUILTIN_CUES: &[(&str, f32)] = &[
    (r"\byeah,?\s+right\b", 0.6),
    (r"(?:^|\s)/s(?:$|[\s.!?])", 0.9),
    (r"\boh,?\s+(?:great|wonderful|joy|fantastic|perfect|sure|wow)\b", 0.5),
    (r"\bthanks\s+for\s+nothing\b", 0.7),
    (r"\bwow,?\s+(?:genius|brilliant|so\s+smart|just\s+wow)\b", 0.6),
    (r"\bnice\s+one,?\s+(?:genius|einstein|sherlock)\b", 0.7),
    (r"\bsure,?\s+(?:jan|buddy|thing\s+buddy)\b", 0.6),
    (r"\bsaid\s+no\s+one\s+ever\b", 0.8),
    (r"\bwhat\s+a\s+(?:genius|surprise|shocker)\b", 0.4),
    (r"\b(?:totally|clearly|definitely)\s+not\s+(?:staged|fake|scripted|biased)\b", 0.5),
    (r"\bas\s+if\b", 0.3),
    (r"\bclown(?:s|ery)?\b", 0.4),
    (
        "[\"\u{201C}'](?:expert|experts|genius|journalist|journalism|professional|news|facts|science)[\"\u{201D}']",
        0.5,
    ),
    ("\u{1F644}", 0.5),
    ("\u{1F921}", 0.5),
    ("\u{1F612}", 0.3),
];

/// Derision classifier backed by a [`DerisionLexicon`].
pub struct DerisionCueClassifier {
    patterns: RegexSet,
    weights: Vec<f32>,
    threshold: f32,
    max_input_chars: usize,
}

impl DerisionCueClassifier {
    /// Compiles the lexicon's cues.
    ///
    /// Fails with [`ClassifierInitError::InvalidResource`] if any pattern is
    /// not a valid regex.
    pub fn new(lexicon: DerisionLexicon) -> Result<Self, ClassifierInitError> {
        let patterns = RegexSet::new(lexicon.cues.iter().map(|c| c.pattern.as_str())).map_err(
            |e| ClassifierInitError::InvalidResource {
                source_name: "derision cues".to_string(),
                reason: e.to_string(),
            },
        )?;

        Ok(Self {
            patterns,
            weights: lexicon.cues.iter().map(|c| c.weight).collect(),
            threshold: lexicon.threshold,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        })
    }

    /// Creates a classifier with the bundled cues.
    pub fn builtin() -> Self {
        Self::new(DerisionLexicon::builtin()).expect("Invalid builtin derision patterns")
    }

    /// Loads the classifier from a lexicon source.
    pub fn load(source: &LexiconSource) -> Result<Self, ClassifierInitError> {
        let lexicon = match source {
            LexiconSource::Builtin => DerisionLexicon::builtin(),
            LexiconSource::File(path) => load_json(path)?,
        };
        lexicon.validate(source)?;
        Self::new(lexicon).map_err(|e| match e {
            ClassifierInitError::InvalidResource { reason, .. } => {
                ClassifierInitError::InvalidResource {
                    source_name: source.describe(),
                    reason,
                }
            }
            other => other,
        })
    }

    /// Sets the maximum accepted input length.
    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    /// Sum of matched cue weights, capped at 1.0.
    pub fn score(&self, text: &str) -> f32 {
        let lower = text.to_lowercase();
        let total: f32 = self
            .patterns
            .matches(&lower)
            .into_iter()
            .map(|index| self.weights[index])
            .sum();
        total.min(1.0)
    }
}

impl TextClassifier for DerisionCueClassifier {
    fn classify(&self, text: &str) -> Result<Prediction, ClassifyError> {
        check_input_len(text, self.max_input_chars)?;

        let score = self.score(text);
        let label = if score >= self.threshold {
            DERISIVE
        } else {
            NON_DERISIVE
        };
        Ok(Prediction::new(label, score))
    }

    fn name(&self) -> &str {
        "derision-cues"
    }
}
