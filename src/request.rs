use std::path::{Path, PathBuf};

use crate::error::SearchError;

/// A deduplicated set of folder roots.
///
/// Paths are compared after canonicalisation, so `./logs`, `logs/` and the
/// absolute path of the same folder are one root. A folder that cannot be
/// canonicalised (typically because it does not exist) is kept in absolute
/// form; the walker will treat it as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootSet {
    roots: Vec<PathBuf>,
}

impl RootSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root, reporting a duplicate instead of ignoring it.
    ///
    /// Returns the normalised path that was stored.
    pub fn insert(&mut self, path: impl AsRef<Path>) -> Result<&Path, SearchError> {
        let root = normalize(path.as_ref());
        if self.roots.contains(&root) {
            return Err(SearchError::DuplicateRoot(root));
        }
        self.roots.push(root);
        Ok(self.roots[self.roots.len() - 1].as_path())
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.roots.contains(&normalize(path.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(PathBuf::as_path)
    }
}

impl<P: AsRef<Path>> Extend<P> for RootSet {
    /// Adds every path, silently skipping duplicates.
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        for path in iter {
            let _ = self.insert(path);
        }
    }
}

impl<P: AsRef<Path>> FromIterator<P> for RootSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// A validated keyword plus the roots to search.
///
/// Consumed by a single search; the keyword never changes after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    keyword: String,
    roots: RootSet,
}

impl SearchRequest {
    /// Trims `keyword` and checks that neither it nor `roots` is empty.
    pub fn new(keyword: &str, roots: RootSet) -> Result<Self, SearchError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(SearchError::EmptyKeyword);
        }
        if roots.is_empty() {
            return Err(SearchError::NoRoots);
        }
        Ok(Self {
            keyword: keyword.to_string(),
            roots,
        })
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn roots(&self) -> &RootSet {
        &self.roots
    }
}
