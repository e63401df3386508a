//! Scanner module - Project file system access for checks

mod filesystem;

use globset::GlobSet;
use regex::Regex;
use std::path::{Path, PathBuf};

pub use filesystem::FileInfo;

/// A line of a file matching a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    pub path: String,
    /// 1-based line number
    pub line: usize,
    pub text: String,
}

impl LineMatch {
    /// `path:line`, as used in finding locations
    pub fn location(&self) -> String {
        format!("{}:{}", self.path, self.line)
    }
}

/// Cached view of the audited project
pub struct Scanner {
    root: PathBuf,
    file_cache: Vec<FileInfo>,
}

impl Scanner {
    /// Create a new scanner for the given root directory
    pub fn new(root: PathBuf) -> Self {
        Self::with_excludes(root, &GlobSet::empty(), &[])
    }

    /// Create a scanner that leaves out excluded paths and directories
    pub fn with_excludes(root: PathBuf, exclude: &GlobSet, skip_dirs: &[String]) -> Self {
        let file_cache = filesystem::scan_directory(&root, exclude, skip_dirs);

        Self { root, file_cache }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Project name from the root directory
    pub fn project_name(&self) -> String {
        self.root
            .canonicalize()
            .ok()
            .as_deref()
            .unwrap_or(self.root.as_path())
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string()
    }

    /// Check if a file exists (bypasses ignore rules)
    pub fn file_exists(&self, path: &str) -> bool {
        self.root.join(path).is_file()
    }

    /// Read file content
    pub fn read_file(&self, path: &str) -> std::io::Result<String> {
        std::fs::read_to_string(self.root.join(path))
    }

    /// Get files with specific extensions
    pub fn files_with_extensions(&self, extensions: &[&str]) -> Vec<&FileInfo> {
        self.file_cache
            .iter()
            .filter(|f| !f.is_dir)
            .filter(|f| {
                extensions
                    .iter()
                    .any(|ext| f.path.ends_with(&format!(".{}", ext)))
            })
            .collect()
    }

    /// Files with the exact given file name, anywhere in the tree
    pub fn files_named(&self, name: &str) -> Vec<&FileInfo> {
        self.file_cache
            .iter()
            .filter(|f| !f.is_dir && f.file_name() == name)
            .collect()
    }

    /// Directories with the exact given name, anywhere in the tree
    pub fn directories_named(&self, name: &str) -> Vec<&FileInfo> {
        self.file_cache
            .iter()
            .filter(|f| f.is_dir && f.file_name() == name)
            .collect()
    }

    /// Get all entries
    pub fn all_files(&self) -> &[FileInfo] {
        &self.file_cache
    }

    /// Lines of production code matching `pattern` in files with the given
    /// extensions. Test files and everything after `#[cfg(test)]` are skipped.
    pub fn search_production(&self, pattern: &Regex, extensions: &[&str]) -> Vec<LineMatch> {
        let mut matches = Vec::new();

        for file in self.files_with_extensions(extensions) {
            if is_test_path(&file.path) {
                continue;
            }
            let Ok(content) = self.read_file(&file.path) else {
                continue;
            };
            for (line, text) in production_lines(&content) {
                if pattern.is_match(text) {
                    matches.push(LineMatch {
                        path: file.path.clone(),
                        line,
                        text: text.trim().to_string(),
                    });
                }
            }
        }

        matches
    }

    /// Lines matching `pattern` in files with the given extensions
    pub fn search(&self, pattern: &Regex, extensions: &[&str]) -> Vec<LineMatch> {
        let mut matches = Vec::new();

        for file in self.files_with_extensions(extensions) {
            let Ok(content) = self.read_file(&file.path) else {
                continue;
            };
            for (idx, text) in content.lines().enumerate() {
                if pattern.is_match(text) {
                    matches.push(LineMatch {
                        path: file.path.clone(),
                        line: idx + 1,
                        text: text.trim().to_string(),
                    });
                }
            }
        }

        matches
    }
}

/// Whether a relative path belongs to test, bench or example code
pub fn is_test_path(path: &str) -> bool {
    let in_test_dir = path
        .split('/')
        .any(|c| matches!(c, "tests" | "test" | "benches" | "examples"));
    let file_name = path.rsplit('/').next().unwrap_or(path);

    in_test_dir
        || file_name.ends_with("_test.rs")
        || file_name.ends_with("_tests.rs")
        || file_name == "tests.rs"
}

/// Numbered lines up to (excluding) the first `#[cfg(test)]`
pub fn production_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(|(idx, line)| (idx + 1, line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_test_path() {
        assert!(is_test_path("server/tests/escrow_e2e.rs"));
        assert!(is_test_path("wallet/src/multisig_test.rs"));
        assert!(is_test_path("benches/recovery_benchmark.rs"));
        assert!(!is_test_path("server/src/handlers/escrow.rs"));
        assert!(!is_test_path("server/src/testing_utils.rs"));
    }

    #[test]
    fn test_production_lines_stop_at_cfg_test() {
        let content = "fn a() {}\nfn b() {}\n#[cfg(test)]\nmod tests {}\n";
        let lines: Vec<_> = production_lines(content).collect();
        assert_eq!(lines, vec![(1, "fn a() {}"), (2, "fn b() {}")]);
    }

    #[test]
    fn test_search_production_skips_tests() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("tests")).unwrap();
        fs::write(
            root.join("src/lib.rs"),
            "let a = x.unwrap();\n#[cfg(test)]\nmod tests { fn t() { y.unwrap(); } }\n",
        )
        .unwrap();
        fs::write(root.join("tests/it.rs"), "z.unwrap();\n").unwrap();

        let scanner = Scanner::new(root.to_path_buf());
        let pattern = Regex::new(r"\.unwrap\(\)").unwrap();
        let matches = scanner.search_production(&pattern, &["rs"]);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].location(), "src/lib.rs:1");

        let everything = scanner.search(&pattern, &["rs"]);
        assert_eq!(everything.len(), 3);
    }

    #[test]
    fn test_files_and_directories_named() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("server/src")).unwrap();
        fs::create_dir_all(root.join("server/migrations")).unwrap();
        fs::write(root.join("server/src/schema.rs"), "").unwrap();

        let scanner = Scanner::new(root.to_path_buf());
        assert_eq!(scanner.files_named("schema.rs").len(), 1);
        assert_eq!(scanner.directories_named("migrations").len(), 1);
        assert!(scanner.directories_named("schema.rs").is_empty());
    }
}
