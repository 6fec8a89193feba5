use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum SortError {
    /// Filesystem failure tied to a concrete path
    Io { path: PathBuf, source: io::Error },
    /// Bad input glob
    Pattern(glob::PatternError),
    /// No record in the input carries a White or Black tag
    NoGames,
    /// The grouping mode needs a tag that no record carries
    MissingTag(&'static str),
    InvalidCompression(String),
    /// Every `NNNN_` number for this name is already used in the directory
    SequenceExhausted { dir: PathBuf, name: String },
    Report(serde_json::Error),
}

impl SortError {
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl fmt::Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortError::Io { path, source } => write!(f, "I/O error on '{}': {}", path.display(), source),
            SortError::Pattern(err) => write!(f, "Invalid input pattern: {}", err),
            SortError::NoGames => write!(f, "No PGN games found in the input directory"),
            SortError::MissingTag(tag) => {
                write!(f, "No '{}' header tags have been found in the input", tag)
            }
            SortError::InvalidCompression(raw) => write!(
                f,
                "Invalid compression value '{}'. Supported values: 'zstd' or omitted.",
                raw
            ),
            SortError::SequenceExhausted { dir, name } => write!(
                f,
                "No free numbered name left for '{}' in '{}'",
                name,
                dir.display()
            ),
            SortError::Report(err) => write!(f, "Failed to encode run report: {}", err),
        }
    }
}

impl std::error::Error for SortError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SortError::Io { source, .. } => Some(source),
            SortError::Pattern(err) => Some(err),
            SortError::Report(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for SortError {
    fn from(source: io::Error) -> Self {
        SortError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl From<glob::PatternError> for SortError {
    fn from(err: glob::PatternError) -> Self {
        SortError::Pattern(err)
    }
}

impl From<serde_json::Error> for SortError {
    fn from(err: serde_json::Error) -> Self {
        SortError::Report(err)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ErrorAccumulator(Option<String>);

impl ErrorAccumulator {
    pub fn push(&mut self, msg: &str) {
        match &mut self.0 {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(msg);
            }
            None => {
                self.0 = Some(msg.to_string());
            }
        }
    }

    pub fn merge(&mut self, mut other: ErrorAccumulator) {
        if let Some(msg) = other.take() {
            self.push(&msg);
        }
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn take(&mut self) -> Option<String> {
        self.0.take()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorAccumulator, SortError};
    use std::io;

    #[test]
    fn test_push_single_message() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("first error");

        assert_eq!(accumulator.take().as_deref(), Some("first error"));
    }

    #[test]
    fn test_push_multiple_messages_uses_separator() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("first");
        accumulator.push("second");

        assert_eq!(accumulator.take().as_deref(), Some("first; second"));
    }

    #[test]
    fn test_merge_appends_other_accumulator() {
        let mut left = ErrorAccumulator::default();
        left.push("a");
        let mut right = ErrorAccumulator::default();
        right.push("b");

        left.merge(right);
        left.merge(ErrorAccumulator::default());

        assert_eq!(left.as_deref(), Some("a; b"));
    }

    #[test]
    fn test_take_consumes_accumulator() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("error");

        assert_eq!(accumulator.take().as_deref(), Some("error"));
        assert!(accumulator.is_empty());
        assert!(accumulator.take().is_none());
    }

    #[test]
    fn test_sort_error_display_includes_path() {
        let err = SortError::io(
            "output/Test Unknown",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("output/Test Unknown"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_missing_tag_display() {
        assert_eq!(
            SortError::MissingTag("ECO").to_string(),
            "No 'ECO' header tags have been found in the input"
        );
    }
}
