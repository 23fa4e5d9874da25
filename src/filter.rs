use std::ffi::OsStr;

use crate::error::SearchError;

/// Extensions scanned when the embedding application does not override them.
pub const DEFAULT_EXTENSIONS: [&str; 4] = [".txt", ".java", ".py", ".log"];

/// How the walker treats a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryClass {
    /// Always recursed into, whatever its name.
    Directory,

    /// A file whose name ends with an allowed extension. Scanned.
    EligibleFile,

    /// Anything else. Skipped without an event.
    IgnoredFile,
}

/// Extension allow-list.
///
/// Matching is a case-sensitive suffix test on the file name, so `notes.TXT`
/// is ignored under the default list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    suffixes: Vec<String>,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            suffixes: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FileFilter {
    /// Build a filter from a custom allow-list.
    ///
    /// A missing leading dot is added (`"md"` becomes `".md"`). Empty
    /// entries are rejected.
    pub fn with_extensions<I, S>(extensions: I) -> Result<Self, SearchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut suffixes = Vec::new();
        for ext in extensions {
            let ext = ext.into();
            let trimmed = ext.trim();
            if trimmed.is_empty() || trimmed == "." {
                return Err(SearchError::InvalidExtension(ext));
            }
            let suffix = if trimmed.starts_with('.') {
                trimmed.to_string()
            } else {
                format!(".{trimmed}")
            };
            if !suffixes.contains(&suffix) {
                suffixes.push(suffix);
            }
        }
        if suffixes.is_empty() {
            return Err(SearchError::InvalidExtension(String::new()));
        }
        Ok(Self { suffixes })
    }

    pub fn extensions(&self) -> &[String] {
        &self.suffixes
    }

    /// Classify one entry. `is_dir` is whatever the filesystem reports.
    pub fn classify(&self, is_dir: bool, name: &OsStr) -> EntryClass {
        if is_dir {
            return EntryClass::Directory;
        }
        // Lossy conversion leaves an ASCII suffix intact.
        let name = name.to_string_lossy();
        if self.suffixes.iter().any(|s| name.ends_with(s.as_str())) {
            EntryClass::EligibleFile
        } else {
            EntryClass::IgnoredFile
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(name: &str) -> EntryClass {
        FileFilter::default().classify(false, OsStr::new(name))
    }

    #[test]
    fn default_list_is_exactly_four() {
        assert_eq!(FileFilter::default().extensions(), [".txt", ".java", ".py", ".log"]);
    }

    #[test]
    fn accepts_allowed_extensions() {
        for name in ["a.txt", "Main.java", "script.py", "server.log"] {
            assert_eq!(classify(name), EntryClass::EligibleFile, "{name}");
        }
    }

    #[test]
    fn ignores_everything_else() {
        for name in ["photo.jpg", "blob.bin", "README", "notes.TXT", "a.txt.bak"] {
            assert_eq!(classify(name), EntryClass::IgnoredFile, "{name}");
        }
    }

    #[test]
    fn directories_win_regardless_of_name() {
        let f = FileFilter::default();
        assert_eq!(f.classify(true, OsStr::new("logs.txt")), EntryClass::Directory);
        assert_eq!(f.classify(true, OsStr::new("bin")), EntryClass::Directory);
    }

    #[test]
    fn custom_extensions_get_a_dot() {
        let f = FileFilter::with_extensions(["md", ".rs", "md"]).unwrap();
        assert_eq!(f.extensions(), [".md", ".rs"]);
        assert_eq!(f.classify(false, OsStr::new("lib.rs")), EntryClass::EligibleFile);
        assert_eq!(f.classify(false, OsStr::new("a.txt")), EntryClass::IgnoredFile);
    }

    #[test]
    fn rejects_empty_extension() {
        assert!(matches!(
            FileFilter::with_extensions([" "]),
            Err(SearchError::InvalidExtension(_))
        ));
        assert!(FileFilter::with_extensions(Vec::<String>::new()).is_err());
    }
}
