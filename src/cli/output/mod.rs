//! Output formatting and report persistence

mod html;
pub mod json;
mod terminal;

pub use html::HtmlReport;
pub use json::{JsonOutput, JsonReport};
pub use terminal::TerminalOutput;

use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::audit::AuditReport;
use crate::error::{ConfigError, ReportError};

/// Trait for rendering report output
pub trait ReportRenderer {
    fn render_report(&self, report: &AuditReport) -> Result<String, ReportError>;
}

/// Attempts made to find a free file name before giving up
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Creates `audit-<timestamp>.<ext>` files in the reports directory.
///
/// Files are created with create-new semantics: an existing file is never
/// overwritten, a numeric suffix is appended instead.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
    stamp: String,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>, started: DateTime<Local>) -> Self {
        Self {
            dir: dir.into(),
            stamp: started.format("%Y%m%d-%H%M%S").to_string(),
        }
    }

    /// Create the reports directory and make sure files can be created in it
    pub fn prepare(dir: &Path) -> Result<(), ConfigError> {
        let unwritable = |source| ConfigError::UnwritableReportDir {
            path: dir.to_path_buf(),
            source,
        };

        fs::create_dir_all(dir).map_err(unwritable)?;
        let metadata = fs::metadata(dir).map_err(unwritable)?;
        if metadata.permissions().readonly() {
            return Err(unwritable(std::io::Error::new(
                ErrorKind::PermissionDenied,
                "directory is read-only",
            )));
        }
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn candidate(&self, attempt: u32, extension: &str) -> PathBuf {
        let name = if attempt == 0 {
            format!("audit-{}.{}", self.stamp, extension)
        } else {
            format!("audit-{}-{}.{}", self.stamp, attempt, extension)
        };
        self.dir.join(name)
    }

    /// Create a new, empty artifact file
    pub fn create(&self, extension: &str) -> Result<(PathBuf, File), ReportError> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = self.candidate(attempt, extension);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(ReportError::FileWrite { path, source }),
            }
        }

        let path = self.candidate(MAX_NAME_ATTEMPTS, extension);
        Err(ReportError::FileWrite {
            path,
            source: std::io::Error::new(ErrorKind::AlreadyExists, "no free file name"),
        })
    }

    /// Create a new artifact file holding `content`
    pub fn write(&self, extension: &str, content: &str) -> Result<PathBuf, ReportError> {
        let (path, mut file) = self.create(extension)?;
        file.write_all(content.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|source| ReportError::FileWrite {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn writer(dir: &Path) -> ReportWriter {
        let started = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        ReportWriter::new(dir, started)
    }

    #[test]
    fn test_timestamped_name() {
        let temp_dir = TempDir::new().unwrap();
        let path = writer(temp_dir.path()).write("json", "{}").unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "audit-20240309-140507.json"
        );
        assert_eq!(fs::read_to_string(path).unwrap(), "{}");
    }

    #[test]
    fn test_collision_gets_suffix_never_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let writer = writer(temp_dir.path());

        let first = writer.write("html", "first").unwrap();
        let second = writer.write("html", "second").unwrap();

        assert_ne!(first, second);
        assert_eq!(
            second.file_name().unwrap().to_str().unwrap(),
            "audit-20240309-140507-1.html"
        );
        assert_eq!(fs::read_to_string(first).unwrap(), "first");
    }

    #[test]
    fn test_prepare_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("audit-reports/nested");
        ReportWriter::prepare(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_prepare_rejects_file_in_the_way() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("audit-reports");
        fs::write(&dir, "not a directory").unwrap();
        assert!(matches!(
            ReportWriter::prepare(&dir),
            Err(ConfigError::UnwritableReportDir { .. })
        ));
    }
}
