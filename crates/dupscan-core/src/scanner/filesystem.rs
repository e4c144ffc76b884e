//! Filesystem discovery helpers for detection runs.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::models::Language;

/// A source file selected for scanning.
#[derive(Clone, Debug)]
pub struct SourceFile {
    /// Path relative to the scanned root, with `/` separators.
    pub path: String,
    pub absolute: PathBuf,
    pub language: Language,
    pub size_bytes: u64,
}

/// Detect a language from a file path's extension.
pub fn detect_language(path: &Path) -> Option<Language> {
    let ext = path.extension()?.to_str()?;
    Language::from_extension(ext)
}

/// Stable numeric id for a source file, derived from its relative path.
///
/// The report format wants small integer ids that survive re-runs over the
/// same tree; a CRC-32 of the normalized relative path gives exactly that.
pub fn stable_file_id(rel_path: &str) -> u32 {
    crc32fast::hash(rel_path.replace('\\', "/").as_bytes())
}

/// SHA-256 hex digest of a file's raw bytes.
pub fn compute_content_hash(path: &Path) -> std::io::Result<String> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Walk `root` and collect every file with a recognized language.
///
/// Respects `.gitignore`, skips hidden entries, and sorts results by
/// relative path so downstream output is independent of directory iteration
/// order. Files whose metadata cannot be read are skipped with a warning.
pub fn discover_files(root: &Path) -> Vec<SourceFile> {
    let mut files = Vec::new();

    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        let Some(language) = detect_language(path) else {
            continue;
        };
        let size_bytes = match entry.metadata() {
            Ok(m) => m.len(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping file without metadata");
                continue;
            }
        };
        let rel = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        files.push(SourceFile {
            path: rel,
            absolute: path.to_path_buf(),
            language,
            size_bytes,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language(Path::new("src/A.java")), Some(Language::Java));
        assert_eq!(detect_language(Path::new("x/y.cs")), Some(Language::CSharp));
        assert_eq!(detect_language(Path::new("noext")), None);
        assert_eq!(detect_language(Path::new("a.xyz")), None);
    }

    #[test]
    fn test_stable_file_id_is_separator_independent() {
        assert_eq!(stable_file_id("a/b.java"), stable_file_id("a\\b.java"));
        assert_ne!(stable_file_id("a/b.java"), stable_file_id("a/c.java"));
    }

    #[test]
    fn test_discover_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.java"), "class B {}").unwrap();
        std::fs::write(dir.path().join("a.java"), "class A {}").unwrap();
        std::fs::write(dir.path().join("notes.xyz"), "ignored").unwrap();

        let files = discover_files(dir.path());
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.java", "b.java"]);
        assert!(files.iter().all(|f| f.language == Language::Java));
    }

    #[test]
    fn test_content_hash_changes_with_content() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("a.java");
        std::fs::write(&p, "one").unwrap();
        let h1 = compute_content_hash(&p).unwrap();
        std::fs::write(&p, "two").unwrap();
        let h2 = compute_content_hash(&p).unwrap();
        assert_ne!(h1, h2);
        assert_eq!(h1.len(), 64);
    }
}
