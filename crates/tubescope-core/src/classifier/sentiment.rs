//! Lexicon-based sentiment polarity classifier.
//!
//! Scores text by the weighted mean valence of the words it contains, with
//! negation and intensifier handling in the spirit of VADER. Emits
//! `positive`, `neutral` or `negative` together with the polarity score in
//! `[-1.0, 1.0]`.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::lexicon::{load_json, LexiconSource};
use super::{
    check_input_len, tokenize, ClassifierInitError, ClassifyError, Prediction, TextClassifier,
    DEFAULT_MAX_INPUT_CHARS,
};

/// Words after a negation that are still affected by it.
const NEGATION_WINDOW: usize = 3;

/// Factor applied to negated valence (flips and dampens).
const NEGATION_FACTOR: f32 = -0.7;

/// Word entry in the valence lexicon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValenceEntry {
    /// Valence score (-1.0 to 1.0).
    pub valence: f32,
    /// Weight/importance of this word.
    #[serde(default = "default_weight")]
    pub weight: f32,
}

fn default_weight() -> f32 {
    1.0
}

fn default_neutral_band() -> f32 {
    0.05
}

/// Valence lexicon plus modifier word lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentLexicon {
    /// Word-level valence entries.
    pub words: HashMap<String, ValenceEntry>,
    /// Words that scale the next sentiment word.
    #[serde(default = "builtin_intensifiers")]
    pub intensifiers: HashMap<String, f32>,
    /// Words that flip the sentiment of the following words.
    #[serde(default = "builtin_negations")]
    pub negations: HashSet<String>,
    /// Polarity magnitude below which text is labelled neutral.
    #[serde(default = "default_neutral_band")]
    pub neutral_band: f32,
}

impl SentimentLexicon {
    /// Returns the bundled lexicon.
    pub fn builtin() -> Self {
        let mut words = HashMap::new();
        for (word, valence, weight) in POSITIVE_WORDS.iter().chain(NEGATIVE_WORDS) {
            words.insert(
                (*word).to_string(),
                ValenceEntry {
                    valence: *valence,
                    weight: *weight,
                },
            );
        }

        Self {
            words,
            intensifiers: builtin_intensifiers(),
            negations: builtin_negations(),
            neutral_band: default_neutral_band(),
        }
    }

    fn validate(&self, source: &LexiconSource) -> Result<(), ClassifierInitError> {
        let invalid = |reason: String| ClassifierInitError::InvalidResource {
            source_name: source.describe(),
            reason,
        };

        if self.words.is_empty() {
            return Err(invalid("lexicon has no words".to_string()));
        }
        if let Some((word, _)) = self.words.iter().find(|(_, e)| {
            !e.valence.is_finite() || !e.weight.is_finite() || e.weight <= 0.0
        }) {
            return Err(invalid(format!("entry for {:?} is not a finite valence/weight", word)));
        }
        if !(0.0..1.0).contains(&self.neutral_band) {
            return Err(invalid(format!("neutral_band {} outside [0, 1)", self.neutral_band)));
        }
        Ok(())
    }
}

fn builtin_intensifiers() -> HashMap<String, f32> {
    [
        ("very", 1.3),
        ("really", 1.3),
        ("extremely", 1.5),
        ("absolutely", 1.5),
        ("totally", 1.3),
        ("so", 1.2),
        ("super", 1.3),
        ("incredibly", 1.4),
        ("insanely", 1.4),
        ("completely", 1.4),
        ("truly", 1.3),
        ("most", 1.2),
    ]
    .into_iter()
    .map(|(w, b)| (w.to_string(), b))
    .collect()
}

fn builtin_negations() -> HashSet<String> {
    [
        "not", "no", "never", "none", "nobody", "nothing", "neither", "nowhere", "cannot",
        "can't", "don't", "doesn't", "didn't", "won't", "wouldn't", "couldn't", "shouldn't",
        "isn't", "aren't", "wasn't", "weren't", "haven't", "hasn't", "hadn't", "ain't",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

const POSITIVE_WORDS: &[(&str, f32, f32)] = &[
    ("love", 0.8, 1.0),
    ("loved", 0.8, 1.0),
    ("loving", 0.7, 0.9),
    ("like", 0.4, 0.6),
    ("liked", 0.4, 0.6),
    ("good", 0.6, 0.8),
    ("great", 0.7, 0.9),
    ("nice", 0.5, 0.7),
    ("cool", 0.5, 0.7),
    ("best", 0.8, 1.0),
    ("better", 0.4, 0.6),
    ("amazing", 0.8, 1.0),
    ("awesome", 0.8, 1.0),
    ("excellent", 0.8, 1.0),
    ("fantastic", 0.8, 1.0),
    ("wonderful", 0.8, 1.0),
    ("brilliant", 0.8, 1.0),
    ("beautiful", 0.7, 0.9),
    ("perfect", 0.8, 1.0),
    ("masterpiece", 0.9, 1.1),
    ("incredible", 0.8, 1.0),
    ("impressive", 0.7, 0.9),
    ("underrated", 0.6, 0.8),
    ("legend", 0.7, 0.9),
    ("legendary", 0.8, 1.0),
    ("happy", 0.8, 1.0),
    ("glad", 0.6, 0.8),
    ("fun", 0.6, 0.8),
    ("funny", 0.6, 0.8),
    ("hilarious", 0.7, 0.9),
    ("helpful", 0.6, 0.8),
    ("useful", 0.6, 0.8),
    ("informative", 0.6, 0.8),
    ("thanks", 0.6, 0.8),
    ("thank", 0.6, 0.8),
    ("grateful", 0.7, 0.9),
    ("appreciate", 0.6, 0.8),
    ("enjoyed", 0.7, 0.9),
    ("enjoy", 0.6, 0.8),
    ("recommend", 0.6, 0.8),
    ("wholesome", 0.7, 0.9),
    ("inspiring", 0.7, 0.9),
    ("favorite", 0.7, 0.9),
    ("favourite", 0.7, 0.9),
    ("excited", 0.7, 0.9),
    ("proud", 0.7, 0.9),
    ("calm", 0.4, 0.6),
    ("peaceful", 0.6, 0.8),
    ("hopeful", 0.6, 0.8),
    ("win", 0.5, 0.7),
    ("goat", 0.7, 0.9),
];

const NEGATIVE_WORDS: &[(&str, f32, f32)] = &[
    ("hate", -0.8, 1.0),
    ("hated", -0.8, 1.0),
    ("dislike", -0.6, 0.8),
    ("bad", -0.5, 0.7),
    ("worse", -0.6, 0.8),
    ("worst", -0.8, 1.0),
    ("terrible", -0.7, 0.9),
    ("awful", -0.7, 0.9),
    ("horrible", -0.8, 1.0),
    ("boring", -0.6, 0.8),
    ("cringe", -0.6, 0.8),
    ("clickbait", -0.7, 0.9),
    ("misleading", -0.6, 0.8),
    ("fake", -0.6, 0.8),
    ("scam", -0.8, 1.0),
    ("waste", -0.7, 0.9),
    ("trash", -0.7, 0.9),
    ("garbage", -0.7, 0.9),
    ("useless", -0.7, 0.9),
    ("pathetic", -0.7, 0.9),
    ("stupid", -0.5, 0.7),
    ("dumb", -0.5, 0.7),
    ("annoying", -0.6, 0.8),
    ("annoyed", -0.5, 0.7),
    ("angry", -0.7, 0.9),
    ("furious", -0.9, 1.1),
    ("sad", -0.7, 1.0),
    ("disappointed", -0.7, 0.9),
    ("disappointing", -0.7, 0.9),
    ("disgusting", -0.7, 0.9),
    ("ugly", -0.6, 0.8),
    ("wrong", -0.5, 0.7),
    ("broken", -0.6, 0.8),
    ("fail", -0.6, 0.8),
    ("failed", -0.6, 0.8),
    ("lame", -0.5, 0.7),
    ("mediocre", -0.4, 0.6),
    ("overrated", -0.5, 0.7),
    ("unwatchable", -0.8, 1.0),
    ("sucks", -0.7, 0.9),
    ("problem", -0.4, 0.6),
    ("scared", -0.5, 0.7),
    ("afraid", -0.5, 0.7),
];

/// Sentiment classifier backed by a [`SentimentLexicon`].
pub struct SentimentLexiconClassifier {
    lexicon: SentimentLexicon,
    max_input_chars: usize,
}

impl SentimentLexiconClassifier {
    /// Creates a classifier over the given lexicon.
    pub fn new(lexicon: SentimentLexicon) -> Self {
        Self {
            lexicon,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    /// Creates a classifier with the bundled lexicon.
    pub fn builtin() -> Self {
        Self::new(SentimentLexicon::builtin())
    }

    /// Loads the classifier from a lexicon source.
    pub fn load(source: &LexiconSource) -> Result<Self, ClassifierInitError> {
        let lexicon = match source {
            LexiconSource::Builtin => SentimentLexicon::builtin(),
            LexiconSource::File(path) => load_json(path)?,
        };
        lexicon.validate(source)?;
        Ok(Self::new(lexicon))
    }

    /// Sets the maximum accepted input length.
    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    /// Computes the polarity of `text` in `[-1.0, 1.0]`.
    pub fn polarity(&self, text: &str) -> f32 {
        let words = tokenize(text);
        if words.is_empty() {
            return 0.0;
        }

        let mut total_score = 0.0f32;
        let mut total_weight = 0.0f32;
        let mut negation_distance: Option<usize> = None;
        let mut pending_intensifier = 1.0f32;

        for word in &words {
            if self.lexicon.negations.contains(word) {
                negation_distance = Some(0);
                continue;
            }

            if let Some(&boost) = self.lexicon.intensifiers.get(word) {
                pending_intensifier = boost;
                continue;
            }

            if let Some(entry) = self.lexicon.words.get(word) {
                let mut score = entry.valence * entry.weight * pending_intensifier;
                if negation_distance.is_some() {
                    score *= NEGATION_FACTOR;
                }
                total_score += score;
                total_weight += entry.weight;
                pending_intensifier = 1.0;
            }

            negation_distance = match negation_distance {
                Some(d) if d + 1 < NEGATION_WINDOW => Some(d + 1),
                _ => None,
            };
        }

        if total_weight > 0.0 {
            (total_score / total_weight).clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }
}

impl TextClassifier for SentimentLexiconClassifier {
    fn classify(&self, text: &str) -> Result<Prediction, ClassifyError> {
        check_input_len(text, self.max_input_chars)?;

        let polarity = self.polarity(text);
        let label = if polarity > self.lexicon.neutral_band {
            "positive"
        } else if polarity < -self.lexicon.neutral_band {
            "negative"
        } else {
            "neutral"
        };

        Ok(Prediction::new(label, polarity))
    }

    fn name(&self) -> &str {
        "sentiment-lexicon"
    }
}
