use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    // Validation
    #[error("keyword is empty")]
    EmptyKeyword,

    #[error("no folders to search")]
    NoRoots,

    #[error("folder already added: {}", .0.display())]
    DuplicateRoot(PathBuf),

    // Config
    #[error("invalid extension: {0:?}")]
    InvalidExtension(String),

    #[error("invalid thread count: {0}")]
    InvalidThreadCount(usize),

    #[error("invalid channel capacity: {0}")]
    InvalidCapacity(usize),

    // Runtime
    #[error("unable to start search: {0}")]
    Spawn(String),
}

impl SearchError {
    /// The path this error refers to, if applicable.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::DuplicateRoot(p) => Some(p),
            _ => None,
        }
    }

    /// Whether this is a caller-side precondition failure.
    ///
    /// Validation errors are always returned synchronously, before any
    /// walking begins. Everything else is an engine fault.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyKeyword
                | Self::NoRoots
                | Self::DuplicateRoot(_)
                | Self::InvalidExtension(_)
                | Self::InvalidThreadCount(_)
                | Self::InvalidCapacity(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_validation_errors() {
        assert!(SearchError::EmptyKeyword.is_validation());
        assert!(SearchError::DuplicateRoot("/tmp".into()).is_validation());
        assert!(!SearchError::Spawn("boom".into()).is_validation());
    }

    #[test]
    fn duplicate_root_carries_path() {
        let err = SearchError::DuplicateRoot("/data/logs".into());
        assert_eq!(err.path(), Some(&PathBuf::from("/data/logs")));
        assert_eq!(err.to_string(), "folder already added: /data/logs");
    }
}
