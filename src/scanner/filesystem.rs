//! File system scanning utilities

use globset::GlobSet;
use ignore::WalkBuilder;
use std::path::Path;

/// Directories never scanned: build output and audit artifacts
const ALWAYS_SKIPPED: &[&str] = &[".git", "target", "node_modules"];

/// Information about a file in the project
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Relative path from project root, `/`-separated
    pub path: String,
    /// Whether the entry is a directory
    pub is_dir: bool,
}

impl FileInfo {
    /// Final path component
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Scan a directory and return information about all entries.
///
/// Honors `.gitignore`. Entries whose relative path matches `exclude`, or
/// that live under one of `skip_dirs` (relative to the root), are left out.
pub fn scan_directory(root: &Path, exclude: &GlobSet, skip_dirs: &[String]) -> Vec<FileInfo> {
    let mut files = Vec::new();

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .ignore(true)
        .parents(false)
        .require_git(false)
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !(entry.depth() > 0 && ALWAYS_SKIPPED.contains(&name.as_ref()))
        })
        .build();

    for entry in walker.flatten() {
        let path = entry.path();

        if path == root {
            continue;
        }

        let relative_path = match path.strip_prefix(root).ok().and_then(|p| p.to_str()) {
            Some(p) => p.replace('\\', "/"),
            None => continue,
        };

        if relative_path.is_empty() || exclude.is_match(&relative_path) {
            continue;
        }

        if skip_dirs
            .iter()
            .any(|d| relative_path == *d || relative_path.starts_with(&format!("{}/", d)))
        {
            continue;
        }

        let Some(file_type) = entry.file_type() else {
            continue;
        };

        files.push(FileInfo {
            path: relative_path,
            is_dir: file_type.is_dir(),
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}
