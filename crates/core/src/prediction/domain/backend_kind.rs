use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Which prediction backend a request asks for.
///
/// Selected by the request's `model` field, case-insensitively.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// The bundled 48×48 grayscale CNN (`"tensorflow"`).
    #[default]
    LocalClassifier,
    /// An external face-analysis service (`"deepface"`).
    ExternalAnalyzer,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown model '{0}', expected 'tensorflow' or 'deepface'")]
pub struct UnknownBackend(pub String);

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::LocalClassifier => "tensorflow",
            BackendKind::ExternalAnalyzer => "deepface",
        }
    }

    /// Resolve an optional selector, defaulting to the local classifier.
    pub fn select(selector: Option<&str>) -> Result<BackendKind, UnknownBackend> {
        match selector {
            None => Ok(BackendKind::default()),
            Some(s) => s.parse(),
        }
    }
}

impl FromStr for BackendKind {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tensorflow" => Ok(BackendKind::LocalClassifier),
            "deepface" => Ok(BackendKind::ExternalAnalyzer),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
