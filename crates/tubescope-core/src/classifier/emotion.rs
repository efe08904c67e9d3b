//! Lexicon-based emotion classifier.
//!
//! Counts cue words (and emoji) per emotion and emits the emotion with the
//! most hits, or `none` when nothing matched. Ties go to the emotion listed
//! first in the lexicon. The score is the winner's share of all hits.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::lexicon::{load_json, LexiconSource};
use super::{
    check_input_len, tokenize, ClassifierInitError, ClassifyError, Prediction, TextClassifier,
    DEFAULT_MAX_INPUT_CHARS,
};

/// Label emitted when no cue matched.
const NO_EMOTION: &str = "none";

/// Tokens after a negation whose cues are ignored.
const NEGATION_WINDOW: usize = 2;

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "wasn't", "aren't", "ain't",
    "can't", "cannot", "won't",
];

/// Cues for one emotion label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionCues {
    /// Label emitted when this emotion wins.
    pub label: String,
    /// Cue words or emoji.
    pub cues: Vec<String>,
}

/// Ordered emotion cue lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionLexicon {
    /// Emotions in tie-breaking order.
    pub emotions: Vec<EmotionCues>,
}

impl EmotionLexicon {
    /// Returns the bundled lexicon.
    pub fn builtin() -> Self {
        let emotions = BUILTIN
            .iter()
            .map(|(label, cues)| EmotionCues {
                label: (*label).to_string(),
                cues: cues.iter().map(|c| (*c).to_string()).collect(),
            })
            .collect();
        Self { emotions }
    }

    fn validate(&self, source: &LexiconSource) -> Result<(), ClassifierInitError> {
        let invalid = |reason: String| ClassifierInitError::InvalidResource {
            source_name: source.describe(),
            reason,
        };

        if self.emotions.is_empty() {
            return Err(invalid("lexicon has no emotions".to_string()));
        }
        if let Some(empty) = self.emotions.iter().find(|e| e.label.trim().is_empty()) {
            return Err(invalid(format!("emotion with cues {:?} has no label", empty.cues)));
        }
        Ok(())
    }
}

const BUILTIN: &[(&str, &[&str])] = &[
    (
        "joy",
        &[
            "happy", "joy", "love", "loved", "lovely", "glad", "delighted", "fun", "funny",
            "hilarious", "lol", "lmao", "haha", "hahaha", "amazing", "awesome", "wonderful",
            "beautiful", "excited", "enjoy", "enjoyed", "smile", "smiling", "laughing", "laughed",
            "yay", "wholesome", "blessed", "\u{1F602}", "\u{1F600}", "\u{1F60D}", "\u{1F970}",
            "\u{1F60A}", "\u{2764}", "\u{1F923}",
        ],
    ),
    (
        "anger",
        &[
            "angry", "mad", "furious", "hate", "hated", "rage", "annoyed", "annoying",
            "infuriating", "outrageous", "pissed", "ridiculous", "unacceptable", "idiot",
            "idiots", "disrespectful", "\u{1F621}", "\u{1F92C}", "\u{1F620}",
        ],
    ),
    (
        "sadness",
        &[
            "sad", "cry", "crying", "cried", "tears", "depressing", "depressed", "miss",
            "missed", "heartbreaking", "heartbroken", "lonely", "unfortunately", "sorry", "rip",
            "grief", "mourn", "\u{1F622}", "\u{1F62D}", "\u{1F494}",
        ],
    ),
    (
        "fear",
        &[
            "scared", "scary", "afraid", "fear", "terrified", "terrifying", "creepy", "horror",
            "nervous", "anxious", "worried", "frightening", "panic", "\u{1F631}", "\u{1F628}",
        ],
    ),
    (
        "surprise",
        &[
            "wow", "whoa", "woah", "omg", "surprised", "surprising", "unexpected", "shocked",
            "shocking", "unbelievable", "insane", "wtf", "twist", "\u{1F62E}", "\u{1F632}",
            "\u{1F92F}",
        ],
    ),
    (
        "disgust",
        &[
            "disgusting", "gross", "nasty", "vile", "ew", "eww", "yuck", "revolting",
            "repulsive", "cringe", "\u{1F922}", "\u{1F92E}",
        ],
    ),
];

/// Cues of one emotion split by how they are matched.
struct CompiledEmotion {
    label: String,
    words: HashSet<String>,
    symbols: Vec<String>,
}

/// Emotion classifier backed by an [`EmotionLexicon`].
pub struct EmotionLexiconClassifier {
    emotions: Vec<CompiledEmotion>,
    negations: HashSet<String>,
    max_input_chars: usize,
}

impl EmotionLexiconClassifier {
    /// Creates a classifier over the given lexicon.
    pub fn new(lexicon: EmotionLexicon) -> Self {
        let emotions = lexicon
            .emotions
            .into_iter()
            .map(|emotion| {
                let (words, symbols): (Vec<String>, Vec<String>) = emotion
                    .cues
                    .into_iter()
                    .map(|c| c.to_lowercase())
                    .filter(|c| !c.is_empty())
                    .partition(|c| c.chars().all(|ch| ch.is_alphanumeric() || ch == '\''));
                CompiledEmotion {
                    label: emotion.label,
                    words: words.into_iter().collect(),
                    symbols,
                }
            })
            .collect();

        Self {
            emotions,
            negations: NEGATIONS.iter().map(|n| (*n).to_string()).collect(),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    /// Creates a classifier with the bundled lexicon.
    pub fn builtin() -> Self {
        Self::new(EmotionLexicon::builtin())
    }

    /// Loads the classifier from a lexicon source.
    pub fn load(source: &LexiconSource) -> Result<Self, ClassifierInitError> {
        let lexicon = match source {
            LexiconSource::Builtin => EmotionLexicon::builtin(),
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

    /// Counts cue hits per emotion, in lexicon order.
    fn hits(&self, text: &str) -> Vec<usize> {
        let tokens = tokenize(text);
        // Symbol cues are stored lowercased.
        let lower = text.to_lowercase();
        let mut negated = vec![false; tokens.len()];
        for (i, token) in tokens.iter().enumerate() {
            if self.negations.contains(token) {
                for flag in negated.iter_mut().skip(i + 1).take(NEGATION_WINDOW) {
                    *flag = true;
                }
            }
        }

        self.emotions
            .iter()
            .map(|emotion| {
                let word_hits = tokens
                    .iter()
                    .zip(&negated)
                    .filter(|(token, negated)| !**negated && emotion.words.contains(*token))
                    .count();
                let symbol_hits: usize = emotion
                    .symbols
                    .iter()
                    .map(|symbol| lower.matches(symbol.as_str()).count())
                    .sum();
                word_hits + symbol_hits
            })
            .collect()
    }
}

impl TextClassifier for EmotionLexiconClassifier {
    fn classify(&self, text: &str) -> Result<Prediction, ClassifyError> {
        check_input_len(text, self.max_input_chars)?;

        let hits = self.hits(text);
        let total: usize = hits.iter().sum();

        let mut best: Option<(usize, usize)> = None;
        for (index, &count) in hits.iter().enumerate() {
            if count > 0 && best.map_or(true, |(_, c)| count > c) {
                best = Some((index, count));
            }
        }

        match best {
            Some((index, count)) => Ok(Prediction::new(
                self.emotions[index].label.clone(),
                count as f32 / total as f32,
            )),
            None => Ok(Prediction::label(NO_EMOTION)),
        }
    }

    fn name(&self) -> &str {
        "emotion-lexicon"
    }
}
