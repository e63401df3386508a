//! Audit command - resolve the run, execute it and write the reports
//!
//! Startup is split in two so that every configuration problem surfaces
//! before a single check runs or a single report file is written:
//! [`prepare`] validates flags, configuration, category selection and the
//! reports directory; [`execute`] runs the audit and renders the results.

use chrono::Local;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::audit::{CheckContext, RunOptions, Runner, Selection};
use crate::checks::default_catalog;
use crate::cli::output::{HtmlReport, JsonOutput, ReportRenderer, ReportWriter, TerminalOutput};
use crate::cli::Cli;
use crate::config::Config;
use crate::error::{AuditError, ConfigError};
use crate::scanner::Scanner;
use crate::tools::ToolRunner;

/// A validated run, ready to execute
pub struct AuditSession {
    root: PathBuf,
    config: Config,
    runner: Runner,
    selected: Vec<usize>,
    writer: ReportWriter,
    log_path: Option<PathBuf>,
    log_file: Option<File>,
    verbose: bool,
    json: bool,
    html: bool,
}

impl AuditSession {
    /// Hand the log file over to the logging setup
    pub fn take_log_file(&mut self) -> Option<File> {
        self.log_file.take()
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Flags override the configuration file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if cli.parallel {
        config.execution.parallel = true;
    }
    if let Some(jobs) = cli.jobs {
        config.execution.jobs = usize::from(jobs);
    }
    if let Some(timeout) = cli.timeout {
        config.execution.check_timeout_secs = timeout;
    }
    if let Some(deadline) = cli.deadline {
        config.execution.deadline_secs = Some(deadline);
    }
}

fn selection(cli: &Cli, config: &Config) -> Selection {
    if cli.quick {
        Selection::Quick(config.quick.categories.clone())
    } else if let Some(category) = &cli.category {
        Selection::Single(category.clone())
    } else {
        Selection::All
    }
}

/// Validate everything that can fail before the run starts
pub fn prepare(cli: &Cli) -> Result<AuditSession, AuditError> {
    let root = cli.directory.clone().unwrap_or_else(|| PathBuf::from("."));
    if !root.is_dir() {
        return Err(ConfigError::MissingProject(root).into());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load_or_default(&root)?,
    };
    apply_overrides(&mut config, cli);
    config.validate()?;

    let options = RunOptions {
        parallel: config.execution.parallel,
        jobs: config.execution.jobs,
        check_timeout: config.check_timeout(),
        deadline: config.deadline(),
        strict: cli.strict,
        fix: cli.fix,
    };

    let mut runner = Runner::new(default_catalog(), config.scorer()?, options);
    let selected = runner.select(&selection(cli, &config))?;

    let reports_dir = match &cli.reports_dir {
        Some(dir) => dir.clone(),
        None => root.join(&config.reports.directory),
    };
    ReportWriter::prepare(&reports_dir)?;
    let writer = ReportWriter::new(reports_dir, Local::now());

    let (log_path, log_file) = if config.reports.log_file && !cli.no_log {
        let (path, file) = writer.create("log")?;
        (Some(path), Some(file))
    } else {
        (None, None)
    };

    Ok(AuditSession {
        root,
        config,
        runner,
        selected,
        writer,
        log_path,
        log_file,
        verbose: cli.verbose > 0,
        json: cli.json,
        html: cli.html,
    })
}

/// Spinner on stderr, only for interactive non-verbose runs
fn spinner() -> Option<ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    Some(progress)
}

/// Relative path of the reports directory, so the scanner leaves it out
fn reports_dir_inside(root: &Path, reports_dir: &Path) -> Vec<String> {
    reports_dir
        .strip_prefix(root)
        .ok()
        .and_then(|p| p.to_str())
        .map(|p| p.replace('\\', "/"))
        .filter(|p| !p.is_empty())
        .into_iter()
        .collect()
}

fn write_report(
    writer: &ReportWriter,
    renderer: &dyn ReportRenderer,
    extension: &str,
    report: &crate::audit::AuditReport,
) {
    let written = renderer
        .render_report(report)
        .and_then(|content| writer.write(extension, &content));

    match written {
        Ok(path) => {
            info!(path = %path.display(), "Report written");
            println!(
                "{} {}",
                format!("{} report:", extension.to_uppercase()).green().bold(),
                path.display().to_string().cyan()
            );
        }
        Err(e) => {
            error!(error = %e, "Failed to write {} report", extension);
            eprintln!("{} {}", "Error:".red().bold(), e);
        }
    }
}

/// Run the audit and return the process exit code
pub async fn execute(session: AuditSession) -> i32 {
    let AuditSession {
        root,
        config,
        runner,
        selected,
        writer,
        log_path,
        verbose,
        json,
        html,
        ..
    } = session;

    let skip_dirs = reports_dir_inside(&root, writer.dir());
    let exclude = match config.exclude_set() {
        Ok(set) => set,
        Err(e) => {
            warn!(error = %e, "Ignoring exclude patterns");
            globset::GlobSet::empty()
        }
    };
    let tools = ToolRunner::new(config.command_timeout())
        .with_disabled(config.disabled_tools().unwrap_or_default());
    let top_issues = config.reports.top_issues;
    let scanner = Scanner::with_excludes(root, &exclude, &skip_dirs);
    let ctx = Arc::new(CheckContext::new(scanner, tools, config));

    let mut runner = match spinner().filter(|_| !verbose) {
        Some(progress) => runner.with_progress(progress),
        None => runner,
    };

    let cancel = runner.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing with partial results");
            cancel.cancel();
        }
    });

    let report = runner.execute(&selected, ctx).await;
    interrupt.abort();

    runner.begin_reporting();

    match TerminalOutput::new(verbose, top_issues).render_report(&report) {
        Ok(text) => print!("{}", text),
        Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
    }

    if json {
        write_report(&writer, &JsonOutput::new(), "json", &report);
    }
    if html {
        write_report(&writer, &HtmlReport::new(), "html", &report);
    }
    if let Some(path) = &log_path {
        println!(
            "{} {}",
            "Log:".dimmed(),
            path.display().to_string().dimmed()
        );
    }

    let exit_code = runner.finish(&report);
    info!(exit_code, score = report.score.value, "Audit finished");
    exit_code
}
