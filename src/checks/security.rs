//! Security checks: credentials, placeholder secrets, unsafe code, headers, advisories

use std::collections::BTreeSet;
use std::fs;

use super::patterns::{
    placeholder_marker, CREDENTIAL_PATTERNS, CSP_HEADER, UNSAFE_CODE, WEB_FRAMEWORK_DEPENDENCY,
};
use super::{code_only, group_by_file};
use crate::audit::{Category, Check, CheckContext, Finding, Severity};
use crate::error::CheckError;
use crate::tools::Tool;

const CATEGORY: &str = "security";

/// Files scanned for hardcoded credentials
const CREDENTIAL_EXTENSIONS: &[&str] = &["rs", "toml", "yml", "yaml", "json", "sh"];

/// Environment files that are meant to hold placeholders
const TEMPLATE_SUFFIXES: &[&str] = &[".example", ".sample", ".template", ".dist"];

pub fn category() -> Category {
    Category::new(CATEGORY, "Security")
        .quick()
        .with_check(HardcodedCredentialsCheck)
        .with_check(PlaceholderSecretsCheck)
        .with_check(UnsafeCodeCheck)
        .with_check(SecurityHeadersCheck)
        .with_check(DependencyAuditCheck)
}

pub struct HardcodedCredentialsCheck;

#[async_trait::async_trait]
impl Check for HardcodedCredentialsCheck {
    fn name(&self) -> &'static str {
        "hardcoded-credentials"
    }

    fn description(&self) -> &'static str {
        "No credentials assigned in source or config files"
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        let mut findings = Vec::new();

        for pattern in CREDENTIAL_PATTERNS.iter() {
            let matches = ctx
                .scanner
                .search_production(&pattern.regex, CREDENTIAL_EXTENSIONS);

            for m in code_only(matches) {
                findings.push(
                    Finding::new(
                        CATEGORY,
                        self.name(),
                        Severity::High,
                        format!("{} in source", pattern.name),
                    )
                    .with_location(m.location())
                    .with_remediation(
                        "Load the value from the environment or a secrets manager and rotate it",
                    ),
                );
            }
        }

        Ok(findings)
    }
}

/// `.env*` values still holding example placeholders
pub struct PlaceholderSecretsCheck;

impl PlaceholderSecretsCheck {
    /// `.env` files at the root (read directly, they are usually ignored)
    /// and anywhere else in the scanned tree
    fn env_files(ctx: &CheckContext) -> BTreeSet<String> {
        let mut files: BTreeSet<String> = ctx
            .scanner
            .all_files()
            .iter()
            .filter(|f| !f.is_dir && f.file_name().starts_with(".env"))
            .map(|f| f.path.clone())
            .collect();

        if let Ok(entries) = fs::read_dir(ctx.root()) {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().to_string();
                if name.starts_with(".env") && entry.path().is_file() {
                    files.insert(name);
                }
            }
        }

        files.retain(|path| !TEMPLATE_SUFFIXES.iter().any(|s| path.ends_with(s)));
        files
    }
}

#[async_trait::async_trait]
impl Check for PlaceholderSecretsCheck {
    fn name(&self) -> &'static str {
        "placeholder-secrets"
    }

    fn description(&self) -> &'static str {
        "No example placeholder values in .env files"
    }

    fn failure_severity(&self) -> Severity {
        Severity::Medium
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        let mut findings = Vec::new();

        for path in Self::env_files(ctx) {
            let Ok(content) = ctx.scanner.read_file(&path) else {
                continue;
            };

            for (idx, line) in content.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let Some((key, value)) = line.split_once('=') else {
                    continue;
                };
                let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                if value.is_empty() {
                    continue;
                }

                if let Some(marker) = placeholder_marker(value) {
                    findings.push(
                        Finding::new(
                            CATEGORY,
                            self.name(),
                            Severity::Medium,
                            format!(
                                "{} holds a placeholder value (contains '{}')",
                                key.trim().trim_start_matches("export ").trim(),
                                marker
                            ),
                        )
                        .with_location(format!("{}:{}", path, idx + 1))
                        .with_remediation("Generate a real value before deploying"),
                    );
                }
            }
        }

        Ok(findings)
    }
}

pub struct UnsafeCodeCheck;

#[async_trait::async_trait]
impl Check for UnsafeCodeCheck {
    fn name(&self) -> &'static str {
        "unsafe-code"
    }

    fn description(&self) -> &'static str {
        "No unsafe blocks outside tests"
    }

    fn failure_severity(&self) -> Severity {
        Severity::Medium
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        let matches = code_only(ctx.scanner.search_production(&UNSAFE_CODE, &["rs"]));

        Ok(group_by_file(matches)
            .into_iter()
            .map(|group| {
                Finding::new(
                    CATEGORY,
                    self.name(),
                    Severity::Medium,
                    format!("{} unsafe block(s) in production code", group.len()),
                )
                .with_location(group[0].location())
                .with_remediation("Replace with a safe abstraction or document the invariants")
            })
            .collect())
    }
}

/// Web servers must send a Content-Security-Policy
pub struct SecurityHeadersCheck;

#[async_trait::async_trait]
impl Check for SecurityHeadersCheck {
    fn name(&self) -> &'static str {
        "security-headers"
    }

    fn description(&self) -> &'static str {
        "Web servers set a Content-Security-Policy header"
    }

    fn failure_severity(&self) -> Severity {
        Severity::Medium
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        let manifest = ctx.scanner.files_named("Cargo.toml").into_iter().find(|f| {
            ctx.scanner
                .read_file(&f.path)
                .map(|content| WEB_FRAMEWORK_DEPENDENCY.is_match(&content))
                .unwrap_or(false)
        });

        let Some(manifest) = manifest else {
            return Ok(Vec::new());
        };

        if !ctx.scanner.search_production(&CSP_HEADER, &["rs"]).is_empty() {
            return Ok(Vec::new());
        }

        Ok(vec![Finding::new(
            CATEGORY,
            self.name(),
            Severity::Medium,
            "Web server without a Content-Security-Policy header",
        )
        .with_location(manifest.path.clone())
        .with_remediation("Add security header middleware (CSP, X-Frame-Options, HSTS)")])
    }
}

/// Known vulnerabilities in dependencies
pub struct DependencyAuditCheck;

#[async_trait::async_trait]
impl Check for DependencyAuditCheck {
    fn name(&self) -> &'static str {
        "dependency-audit"
    }

    fn description(&self) -> &'static str {
        "No dependency with a known advisory (cargo-audit)"
    }

    async fn run(&self, ctx: &CheckContext) -> Result<Vec<Finding>, CheckError> {
        if !ctx.scanner.file_exists("Cargo.toml") {
            return Ok(Vec::new());
        }

        let result = ctx
            .tools
            .require(Tool::CargoAudit, &["--quiet"], ctx.root())
            .await?;

        if result.success() {
            return Ok(Vec::new());
        }

        let output = result.combined();
        let advisories: Vec<&str> = output
            .lines()
            .map(str::trim)
            .filter_map(|l| l.strip_prefix("ID:"))
            .map(str::trim)
            .collect();

        if advisories.is_empty() {
            return Err(CheckError::Execution(format!(
                "cargo audit failed: {}",
                result.summary_line()
            )));
        }

        Ok(vec![Finding::new(
            CATEGORY,
            self.name(),
            Severity::High,
            format!(
                "{} vulnerable dependenc{} ({})",
                advisories.len(),
                if advisories.len() == 1 { "y" } else { "ies" },
                advisories.join(", ")
            ),
        )
        .with_location("Cargo.lock")
        .with_remediation("Run `cargo update` or replace the affected crates")])
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

    fn write(dir: &TempDir, path: &str, content: &str) {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }

    #[tokio::test]
    async fn test_hardcoded_credentials() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "src/db.rs",
            "const URL: &str = \"postgres://admin:hunter2@db/market\";\n\
             // let password = \"commented-out-secret\";\n\
             #[cfg(test)]\nmod tests { const P: &str = \"password = 'testtesttest'\"; }\n",
        );

        let findings = HardcodedCredentialsCheck.run(&context(&dir)).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location(), Some("src/db.rs:1"));
        assert_eq!(findings[0].severity(), Severity::High);
    }

    #[tokio::test]
    async fn test_placeholder_secrets_in_env() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            ".env",
            "# database\nDB_ENCRYPTION_KEY=your-64-char-hex-key-here\nJWT_SECRET=\"9f2c1a77be04d3e1\"\nEMPTY=\n",
        );
        write(&dir, ".env.example", "DB_ENCRYPTION_KEY=your-key-here\n");

        let findings = PlaceholderSecretsCheck.run(&context(&dir)).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location(), Some(".env:2"));
        assert!(findings[0].message().starts_with("DB_ENCRYPTION_KEY"));
        assert!(!findings[0].message().contains("64-char"), "value is not echoed");
    }

    #[tokio::test]
    async fn test_unsafe_code_grouped_per_file() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "src/ffi.rs",
            "fn a() { unsafe { x() } }\nunsafe fn b() {}\n",
        );
        write(&dir, "tests/ffi.rs", "fn t() { unsafe { x() } }\n");

        let findings = UnsafeCodeCheck.run(&context(&dir)).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message().starts_with("2 unsafe"));
    }

    #[tokio::test]
    async fn test_security_headers() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "server/Cargo.toml",
            "[dependencies]\nactix-web = \"4\"\n",
        );
        write(&dir, "server/src/main.rs", "fn main() {}\n");

        let findings = SecurityHeadersCheck.run(&context(&dir)).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location(), Some("server/Cargo.toml"));

        write(
            &dir,
            "server/src/middleware.rs",
            "const CSP: &str = \"Content-Security-Policy\";\n",
        );
        assert!(SecurityHeadersCheck
            .run(&context(&dir))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_security_headers_without_web_framework() {
        let dir = TempDir::new().unwrap();
        write(&dir, "Cargo.toml", "[dependencies]\nserde = \"1\"\n");
        assert!(SecurityHeadersCheck
            .run(&context(&dir))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_dependency_audit_without_tool_is_skip() {
        let dir = TempDir::new().unwrap();
        write(&dir, "Cargo.toml", "[package]\nname = \"x\"\n");

        let err = DependencyAuditCheck.run(&context(&dir)).await.unwrap_err();
        assert!(err.is_skip());
    }
}
