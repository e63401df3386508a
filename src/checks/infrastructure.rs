//! Infrastructure checks: database schema, migrations, lockfile, environment files

use globset::Glob;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::audit::{Category, Check, CheckContext, Finding, Remediation, Severity};
use crate::error::CheckError;
use crate::tools::{Tool, ToolOutcome};

const CATEGORY: &str = "infrastructure";

pub fn category() -> Category {
    Category::new(CATEGORY, "Infrastructure")
        .quick()
        .with_check(SchemaCheck)
        .with_check(MigrationsCheck)
        .with_check(LockfileCheck)
        .with_check(EnvFileCheck)
        .with_check(PendingMigrationsCheck)
        .with_check(SqliteIntegrityCheck)
}

/// Diesel's generated `schema.rs` must be present
pub struct SchemaCheck;

#[async_trait::async_trait]
impl Check for SchemaCheck {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn description(&self) -> &'static str {
        "Diesel schema.rs exists"
    }

    fn failure_severity(&self) -> Severity {
        Severity::Critical
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        if !ctx.scanner.files_named("schema.rs").is_empty() {
            return Ok(Vec::new());
        }

        Ok(vec![Finding::new(
            CATEGORY,
            self.name(),
            Severity::Critical,
            "Database schema file schema.rs not found",
        )
        .with_remediation("Run `diesel print-schema > src/schema.rs` against the database")])
    }
}

pub struct MigrationsCheck;

#[async_trait::async_trait]
impl Check for MigrationsCheck {
    fn name(&self) -> &'static str {
        "migrations"
    }

    fn description(&self) -> &'static str {
        "A migrations/ directory exists"
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        if !ctx.scanner.directories_named("migrations").is_empty() {
            return Ok(Vec::new());
        }

        Ok(vec![Finding::new(
            CATEGORY,
            self.name(),
            Severity::High,
            "No migrations/ directory found",
        )
        .with_remediation("Run `diesel setup` to create the migrations directory")])
    }
}

pub struct LockfileCheck;

#[async_trait::async_trait]
impl Check for LockfileCheck {
    fn name(&self) -> &'static str {
        "lockfile"
    }

    fn description(&self) -> &'static str {
        "Cargo.lock is committed next to Cargo.toml"
    }

    fn failure_severity(&self) -> Severity {
        Severity::Medium
    }

    fn remediation(&self, _ctx: &CheckContext) -> Option<Remediation> {
        Some(Remediation::new(Tool::Cargo, &["generate-lockfile"]))
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        if !ctx.scanner.file_exists("Cargo.toml") || ctx.scanner.file_exists("Cargo.lock") {
            return Ok(Vec::new());
        }

        Ok(vec![Finding::new(
            CATEGORY,
            self.name(),
            Severity::Medium,
            "Cargo.toml present but Cargo.lock is missing; builds are not reproducible",
        )
        .with_location("Cargo.toml")
        .with_remediation("Run `cargo generate-lockfile` and commit Cargo.lock")])
    }
}

/// A `.env` file must be ignored by git
pub struct EnvFileCheck;

#[async_trait::async_trait]
impl Check for EnvFileCheck {
    fn name(&self) -> &'static str {
        "env-file"
    }

    fn description(&self) -> &'static str {
        ".env is covered by .gitignore"
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        // The scanner honors .gitignore, so look at the file system directly.
        if !ctx.root().join(".env").is_file() {
            return Ok(Vec::new());
        }

        let ignored = match ctx
            .tools
            .run(Tool::Git, &["check-ignore", "-q", ".env"], ctx.root())
            .await
        {
            ToolOutcome::Completed(result) if result.exit_code == 0 => true,
            ToolOutcome::Completed(result) if result.exit_code == 1 => false,
            _ => {
                debug!("git check-ignore unusable, reading .gitignore directly");
                gitignore_covers(ctx.root(), ".env")
            }
        };

        if ignored {
            return Ok(Vec::new());
        }

        Ok(vec![Finding::new(
            CATEGORY,
            self.name(),
            Severity::High,
            ".env file is not listed in .gitignore and may be committed",
        )
        .with_location(".env")
        .with_remediation("Add `.env` to .gitignore and rotate any secrets it contained")])
    }
}

/// Whether the root `.gitignore` has a pattern matching `name`
fn gitignore_covers(root: &Path, name: &str) -> bool {
    let Ok(content) = fs::read_to_string(root.join(".gitignore")) else {
        return false;
    };

    let mut covered = false;
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (negated, pattern) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let pattern = pattern.trim_start_matches('/');
        let Ok(glob) = Glob::new(pattern) else {
            continue;
        };
        if glob.compile_matcher().is_match(name) {
            covered = !negated;
        }
    }
    covered
}

/// Migrations not yet applied to the configured database
pub struct PendingMigrationsCheck;

#[async_trait::async_trait]
impl Check for PendingMigrationsCheck {
    fn name(&self) -> &'static str {
        "pending-migrations"
    }

    fn description(&self) -> &'static str {
        "All Diesel migrations are applied (diesel)"
    }

    fn failure_severity(&self) -> Severity {
        Severity::Medium
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        let Some(migrations) = ctx.scanner.directories_named("migrations").first().copied() else {
            return Ok(Vec::new());
        };
        let project_dir = match migrations.path.rsplit_once('/') {
            Some((parent, _)) => ctx.root().join(parent),
            None => ctx.root().to_path_buf(),
        };

        let result = ctx
            .tools
            .require(Tool::Diesel, &["migration", "pending"], &project_dir)
            .await?;

        if !result.success() {
            return Err(CheckError::Execution(format!(
                "diesel migration pending failed: {}",
                result.summary_line()
            )));
        }

        if result.stdout.trim() != "true" {
            return Ok(Vec::new());
        }

        Ok(vec![Finding::new(
            CATEGORY,
            self.name(),
            Severity::Medium,
            "Database has pending migrations",
        )
        .with_location(migrations.path.clone())
        .with_remediation("Run `diesel migration run`")])
    }
}

pub struct SqliteIntegrityCheck;

#[async_trait::async_trait]
impl Check for SqliteIntegrityCheck {
    fn name(&self) -> &'static str {
        "sqlite-integrity"
    }

    fn description(&self) -> &'static str {
        "SQLite databases pass PRAGMA integrity_check (sqlite3)"
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        let databases = ctx.scanner.files_with_extensions(&["db", "sqlite", "sqlite3"]);
        let mut findings = Vec::new();

        for db in databases {
            let result = ctx
                .tools
                .require(
                    Tool::Sqlite3,
                    &[db.path.as_str(), "PRAGMA integrity_check;"],
                    ctx.root(),
                )
                .await?;

            let verdict = result.stdout.trim();
            if result.success() && verdict == "ok" {
                continue;
            }

            findings.push(
                Finding::new(
                    CATEGORY,
                    self.name(),
                    Severity::High,
                    format!(
                        "SQLite integrity check failed: {}",
                        if verdict.is_empty() {
                            result.summary_line()
                        } else {
                            verdict.lines().next().unwrap_or(verdict).to_string()
                        }
                    ),
                )
                .with_location(db.path.clone()),
            );
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::scanner::Scanner;
    use crate::tools::ToolRunner;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> CheckContext {
        CheckContext::new(
            Scanner::new(dir.path().to_path_buf()),
            ToolRunner::default().with_disabled(Tool::ALL),
            Config::default(),
        )
    }

    #[tokio::test]
    async fn test_schema_missing_is_critical() {
        let dir = TempDir::new().unwrap();
        let findings = SchemaCheck.run(&context(&dir)).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity(), Severity::Critical);
    }

    #[tokio::test]
    async fn test_schema_found_in_subdirectory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("server/src")).unwrap();
        fs::write(dir.path().join("server/src/schema.rs"), "table! {}").unwrap();

        assert!(SchemaCheck.run(&context(&dir)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_migrations_directory() {
        let dir = TempDir::new().unwrap();
        assert_eq!(MigrationsCheck.run(&context(&dir)).await.unwrap().len(), 1);

        fs::create_dir_all(dir.path().join("migrations/2024-01-01_init")).unwrap();
        fs::write(dir.path().join("migrations/2024-01-01_init/up.sql"), "").unwrap();
        assert!(MigrationsCheck.run(&context(&dir)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lockfile_missing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"x\"\n").unwrap();

        let ctx = context(&dir);
        let findings = LockfileCheck.run(&ctx).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity(), Severity::Medium);
        assert_eq!(
            LockfileCheck.remediation(&ctx).unwrap().command_line(),
            "cargo generate-lockfile"
        );

        fs::write(dir.path().join("Cargo.lock"), "").unwrap();
        assert!(LockfileCheck.run(&context(&dir)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_env_file_not_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "DATABASE_URL=market.db\n").unwrap();

        let findings = EnvFileCheck.run(&context(&dir)).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location(), Some(".env"));
    }

    #[tokio::test]
    async fn test_env_file_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "DATABASE_URL=market.db\n").unwrap();
        fs::write(dir.path().join(".gitignore"), "target/\n/.env\n").unwrap();

        assert!(EnvFileCheck.run(&context(&dir)).await.unwrap().is_empty());
    }

    #[test]
    fn test_gitignore_negation() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), ".env*\n!.env\n").unwrap();
        assert!(!gitignore_covers(dir.path(), ".env"));

        fs::write(dir.path().join(".gitignore"), ".env*\n").unwrap();
        assert!(gitignore_covers(dir.path(), ".env"));
    }

    #[tokio::test]
    async fn test_pending_migrations_without_diesel_is_skip() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("migrations")).unwrap();

        let err = PendingMigrationsCheck
            .run(&context(&dir))
            .await
            .unwrap_err();
        assert!(err.is_skip());
    }

    #[tokio::test]
    async fn test_pending_migrations_without_migrations_passes() {
        let dir = TempDir::new().unwrap();
        assert!(PendingMigrationsCheck
            .run(&context(&dir))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_sqlite_integrity_without_databases_passes() {
        let dir = TempDir::new().unwrap();
        assert!(SqliteIntegrityCheck
            .run(&context(&dir))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_sqlite_integrity_without_sqlite3_is_skip() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("market.db"), "").unwrap();

        let err = SqliteIntegrityCheck.run(&context(&dir)).await.unwrap_err();
        assert!(matches!(err, CheckError::ToolUnavailable { ref tool } if tool == "sqlite3"));
    }
}
