//! Lexicon resource loading.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ClassifierInitError;

/// Where a classifier gets its lexicon from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum LexiconSource {
    /// The lexicon compiled into the binary.
    #[default]
    Builtin,
    /// A JSON lexicon file.
    File(PathBuf),
}

impl LexiconSource {
    /// Creates a source from an optional path.
    pub fn from_path(path: Option<PathBuf>) -> Self {
        path.map_or(LexiconSource::Builtin, LexiconSource::File)
    }

    /// Short description for logs and error messages.
    pub fn describe(&self) -> String {
        match self {
            LexiconSource::Builtin => "builtin".to_string(),
            LexiconSource::File(path) => path.display().to_string(),
        }
    }
}

/// Reads and parses a JSON lexicon file.
pub(crate) fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ClassifierInitError> {
    if !path.exists() {
        return Err(ClassifierInitError::ResourceNotFound(path.to_path_buf()));
    }

    let raw = std::fs::read_to_string(path).map_err(|source| ClassifierInitError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed = serde_json::from_str(&raw).map_err(|e| ClassifierInitError::InvalidResource {
        source_name: path.display().to_string(),
        reason: e.to_string(),
    })?;

    info!(path = %path.display(), bytes = raw.len(), "Loaded lexicon file");
    Ok(parsed)
}
