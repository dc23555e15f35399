//! `.aigitignore` loading and path matching.
//!
//! Patterns are shell-style globs, one per line. A trailing `/` turns a
//! pattern into a directory prefix rule. Unlike `.gitignore` there is no
//! negation and no anchoring: every glob is matched against the whole
//! repository-relative path, and `*` is allowed to cross `/`. Runs of `*`
//! collapse to one, so `**` means the same as `*` anywhere in a pattern.

use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use glob::Pattern;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::IgnoreError;

/// Name of the pattern file under the repository root.
pub const IGNORE_FILE_NAME: &str = ".aigitignore";

/// Written when the repository has no `.aigitignore` yet.
pub const DEFAULT_IGNORE_FILE: &str = "\
# IDE
.idea/
.vscode/
*.iml
*.iws
*.ipr

# Build output
__pycache__/
*.py[cod]
*$py.class
*.so
build/
dist/

# Virtual environments
venv/
env/
.env/
.venv/

# Logs
logs/
*.log

# OS files
.DS_Store
Thumbs.db
";

#[derive(Debug, Clone)]
enum Rule {
    /// `dir/`: prefix match, with or without the slash.
    Directory { with_slash: String },
    Glob(Pattern),
    /// Not a valid glob; compared verbatim.
    Literal(String),
}

impl Rule {
    fn parse(raw: &str) -> Self {
        if raw.ends_with('/') {
            return Rule::Directory {
                with_slash: raw.to_string(),
            };
        }
        match Pattern::new(&collapse_stars(raw)) {
            Ok(pattern) => Rule::Glob(pattern),
            Err(e) => {
                warn!("Ignore pattern '{}' is not a valid glob ({}), matching literally", raw, e);
                Rule::Literal(raw.to_string())
            }
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Rule::Directory { with_slash } => {
                let bare = &with_slash[..with_slash.len() - 1];
                path.starts_with(with_slash.as_str()) || path.starts_with(bare)
            }
            Rule::Glob(pattern) => pattern.matches(path),
            Rule::Literal(literal) => path == literal,
        }
    }
}

/// `glob` only accepts `**` as a whole path component; a single `*`
/// already crosses separators here.
fn collapse_stars(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '*' && out.ends_with('*') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Set of ignore patterns rooted at a repository working directory.
#[derive(Debug, Clone)]
pub struct IgnoreFilter {
    root: PathBuf,
    patterns: Vec<String>,
    rules: Vec<Rule>,
}

impl IgnoreFilter {
    /// Load `<root>/.aigitignore`, creating it with [`DEFAULT_IGNORE_FILE`]
    /// first if it does not exist. An existing file is never rewritten.
    pub fn load(root: &Path) -> Result<Self, IgnoreError> {
        let path = root.join(IGNORE_FILE_NAME);

        if !path.exists() {
            info!("Creating default {}", path.display());
            write_default(root, &path)?;
        }

        let content = std::fs::read_to_string(&path).map_err(|source| IgnoreError::ReadFailed {
            path: path.clone(),
            source,
        })?;

        let filter = Self::from_patterns(root, parse_patterns(&content));
        debug!("Loaded ignore patterns: {:?}", filter.patterns);
        Ok(filter)
    }

    /// Build a filter from already-parsed patterns.
    pub fn from_patterns<I, S>(root: &Path, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for pattern in patterns {
            let pattern = pattern.into();
            if !unique.contains(&pattern) {
                unique.push(pattern);
            }
        }
        let rules = unique.iter().map(|p| Rule::parse(p)).collect();

        Self {
            root: root.to_path_buf(),
            patterns: unique,
            rules,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether `path` matches any pattern.
    ///
    /// Absolute paths under the root are made relative first; relative paths
    /// are taken as repository-relative.
    pub fn should_ignore(&self, path: impl AsRef<Path>) -> bool {
        let relative = self.relative_path(path.as_ref());
        self.rules.iter().any(|rule| rule.matches(&relative))
    }

    fn relative_path(&self, path: &Path) -> String {
        let path = path.strip_prefix(&self.root).unwrap_or(path);
        path.components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Parse pattern-file content: trimmed lines, blanks and `#` comments dropped.
pub fn parse_patterns(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn write_default(root: &Path, path: &Path) -> Result<(), IgnoreError> {
    let write_failed = |source| IgnoreError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(root).map_err(write_failed)?;
    tmp.write_all(DEFAULT_IGNORE_FILE.as_bytes())
        .map_err(write_failed)?;

    match tmp.persist_noclobber(path) {
        Ok(_) => Ok(()),
        // Someone created it in the meantime; theirs wins.
        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(write_failed(e.error)),
    }
}
