//! Text classifiers consumed by the statistics engines.
//!
//! A classifier maps one piece of text to a single label and an optional
//! score. The engines treat classifiers as black boxes: they only see the
//! label string, which each engine parses into its own closed taxonomy.
//!
//! The bundled classifiers are lexicon based. Their lexicons are the
//! "model" resource: built in by default, or loaded from a JSON file when a
//! path is configured.

mod derision;
mod emotion;
mod lexicon;
mod sentiment;

use std::borrow::Cow;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub use derision::{DerisionCue, DerisionCueClassifier, DerisionLexicon};
pub use emotion::{EmotionLexicon, EmotionLexiconClassifier};
pub use lexicon::LexiconSource;
pub use sentiment::{SentimentLexicon, SentimentLexiconClassifier, ValenceEntry};

/// Longest input the bundled classifiers accept, in characters.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 20_000;

/// Output of a single classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Label as emitted by the classifier.
    pub label: String,
    /// Optional numeric score attached to the label.
    pub score: Option<f32>,
}

impl Prediction {
    /// Creates a prediction with a score.
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score: Some(score),
        }
    }

    /// Creates a prediction without a score.
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            score: None,
        }
    }
}

/// Failure to classify one text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// The input exceeds what the classifier accepts.
    #[error("input of {len} chars exceeds limit of {max}")]
    InputTooLong { len: usize, max: usize },

    /// The classifier did not answer in time.
    #[error("classification timed out")]
    TimedOut,

    /// Any other inference failure.
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Failure to construct a classifier.
#[derive(Debug, Error)]
pub enum ClassifierInitError {
    /// The configured resource does not exist.
    #[error("classifier resource not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    /// The resource could not be read.
    #[error("failed to read classifier resource {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The resource was read but is not usable.
    #[error("invalid classifier resource {source_name}: {reason}")]
    InvalidResource { source_name: String, reason: String },
}

/// A single-label text classifier.
pub trait TextClassifier: Send + Sync {
    /// Classifies `text` into one label.
    fn classify(&self, text: &str) -> Result<Prediction, ClassifyError>;

    /// Returns the name of this classifier for logging.
    fn name(&self) -> &str;
}

impl<T: TextClassifier + ?Sized> TextClassifier for Box<T> {
    fn classify(&self, text: &str) -> Result<Prediction, ClassifyError> {
        (**self).classify(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

static MARKUP_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|</p\s*>").expect("valid break pattern"));
static MARKUP_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?[a-zA-Z][^<>]*>").expect("valid tag pattern"));
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").expect("valid entity pattern"));

/// Normalizes comment text before classification.
///
/// Removes markup tags left by the source service (line breaks become
/// spaces), decodes HTML entities, collapses whitespace and trims. The
/// stored comment text is never modified; engines call this on the fly.
pub fn normalize_text(text: &str) -> Cow<'_, str> {
    let needs_markup = text.contains('<') || text.contains('&');
    if !needs_markup && is_collapsed(text) {
        return Cow::Borrowed(text);
    }

    let mut owned = text.to_string();
    if needs_markup {
        owned = MARKUP_BREAK.replace_all(&owned, " ").into_owned();
        owned = MARKUP_TAG.replace_all(&owned, "").into_owned();
        owned = ENTITY
            .replace_all(&owned, |caps: &regex::Captures<'_>| {
                decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned();
    }

    Cow::Owned(owned.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// True if `text` has no leading, trailing, repeated or non-space whitespace.
fn is_collapsed(text: &str) -> bool {
    let mut previous_space = true;
    for c in text.chars() {
        if c.is_whitespace() {
            if c != ' ' || previous_space {
                return false;
            }
            previous_space = true;
        } else {
            previous_space = false;
        }
    }
    !previous_space || text.is_empty()
}

fn decode_entity(name: &str) -> Option<String> {
    if let Some(numeric) = name.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }

    let decoded = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        _ => return None,
    };
    Some(decoded.to_string())
}

/// Splits normalized text into lowercase word tokens.
///
/// Apostrophes stay inside words so negations like `don't` survive.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .map(|w| w.trim_matches(|c| c == '\'' || c == '\u{2019}').replace('\u{2019}', "'"))
        .filter(|w| !w.is_empty())
        .collect()
}

/// Rejects inputs longer than `max` characters.
pub(crate) fn check_input_len(text: &str, max: usize) -> Result<(), ClassifyError> {
    let len = text.chars().count();
    if len > max {
        return Err(ClassifyError::InputTooLong { len, max });
    }
    Ok(())
}
