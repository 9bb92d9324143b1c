//! Source file discovery.
//!
//! Walks a directory tree, maps extensions onto [`Language`], and skips
//! the directories and file patterns that never hold testable code:
//! hidden entries, dependency and build output trees, and files that are
//! already tests.

use std::path::Path;

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::types::{Language, SourceFile};
use crate::{Result, TestforgeError};

const SKIP_DIRS: &[&str] = &["vendor", "node_modules", "target", "dist", "build", "__pycache__"];

/// Discover candidate source files under `root`.
///
/// A single-file `root` is returned as-is when its language is
/// supported. Results come back in walk order (depth-first, sorted by
/// file name) so runs over the same tree are stable.
pub fn scan(root: &Path) -> Result<Vec<SourceFile>> {
    if root.is_file() {
        return match Language::from_path(root) {
            Some(language) => Ok(vec![SourceFile::new(root, language)]),
            None => Err(TestforgeError::Configuration(format!(
                "unsupported file type: {}",
                root.display()
            ))),
        };
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
    {
        let entry = entry.map_err(|e| TestforgeError::Configuration(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(language) = Language::from_path(path) else {
            continue;
        };
        if is_test_file(path, language) {
            debug!(path = %path.display(), "skipping existing test file");
            continue;
        }
        files.push(SourceFile::new(path, language));
    }
    Ok(files)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() || entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIP_DIRS.contains(&name.as_ref())
}

/// Whether a path already looks like a test file for its language.
fn is_test_file(path: &Path, language: Language) -> bool {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    match language {
        Language::Go => stem.ends_with("_test"),
        Language::Python => stem.starts_with("test_") || stem.ends_with("_test"),
        Language::JavaScript | Language::TypeScript => {
            stem.ends_with(".test") || stem.ends_with(".spec")
        }
        Language::Rust => stem.ends_with("_test") || stem == "tests",
        Language::Java => stem.ends_with("Test") || stem.ends_with("Tests"),
    }
}
