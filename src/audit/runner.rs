//! Audit runner
//!
//! Drives one run through `Idle → Selecting → Executing → Scoring →
//! Reporting → Done`. Categories always run in declaration order. Checks
//! inside a category run in declaration order, or concurrently in parallel
//! mode, in which case outcomes are re-sorted into declaration order before
//! they reach the collector.

use chrono::Utc;
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, span, warn, Instrument, Level};

use super::check::{Category, Check, CheckContext};
use super::collector::Collector;
use super::report::{AuditReport, CategorySummary};
use super::results::{Finding, Severity};
use super::scoring::Scorer;
use crate::cli::exit_codes;
use crate::error::ConfigError;
use crate::tools::ToolOutcome;
use crate::utils::timing::{CategoryTiming, RunTiming, Timer};

/// Which categories to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every category, in declaration order
    All,
    /// The quick subset; empty list means categories flagged quick
    Quick(Vec<String>),
    /// Exactly one category, by 1-based number, id or title
    Single(String),
}

/// Runner lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Selecting,
    Executing,
    Scoring,
    Reporting,
    Done,
}

/// Execution options
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub parallel: bool,
    pub jobs: usize,
    pub check_timeout: Duration,
    pub deadline: Option<Duration>,
    pub strict: bool,
    pub fix: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            jobs: 4,
            check_timeout: Duration::from_secs(600),
            deadline: None,
            strict: false,
            fix: false,
        }
    }
}

/// Outcome of one check invocation
#[derive(Debug)]
enum CheckOutcome {
    Findings(Vec<Finding>),
    Skipped(String),
    Failed(String),
    Cancelled,
}

/// Orchestrates category execution, scoring and exit-code derivation
pub struct Runner {
    categories: Vec<Category>,
    scorer: Scorer,
    options: RunOptions,
    cancel: CancellationToken,
    state: RunnerState,
    progress: Option<ProgressBar>,
}

impl Runner {
    pub fn new(categories: Vec<Category>, scorer: Scorer, options: RunOptions) -> Self {
        Self {
            categories,
            scorer,
            options,
            cancel: CancellationToken::new(),
            state: RunnerState::Idle,
            progress: None,
        }
    }

    /// Show the running category on a spinner
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Token that aborts the run; recorded findings are still reported
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn transition(&mut self, next: RunnerState) {
        debug!(from = ?self.state, to = ?next, "Runner state change");
        self.state = next;
    }

    /// Resolve the categories to run, as indexes in declaration order
    pub fn select(&mut self, selection: &Selection) -> Result<Vec<usize>, ConfigError> {
        self.transition(RunnerState::Selecting);

        let selected = match selection {
            Selection::All => (0..self.categories.len()).collect(),
            Selection::Quick(ids) if ids.is_empty() => self
                .categories
                .iter()
                .enumerate()
                .filter(|(_, c)| c.is_quick())
                .map(|(i, _)| i)
                .collect(),
            Selection::Quick(ids) => {
                let mut indexes = Vec::new();
                for id in ids {
                    indexes.push(self.resolve(id)?);
                }
                indexes.sort_unstable();
                indexes.dedup();
                indexes
            }
            Selection::Single(name) => vec![self.resolve(name)?],
        };

        debug!(?selected, "Categories selected");
        Ok(selected)
    }

    fn resolve(&self, name: &str) -> Result<usize, ConfigError> {
        let name = name.trim();

        if let Ok(number) = name.parse::<usize>() {
            if (1..=self.categories.len()).contains(&number) {
                return Ok(number - 1);
            }
        }

        self.categories
            .iter()
            .position(|c| c.matches(name))
            .ok_or_else(|| ConfigError::UnknownCategory {
                name: name.to_string(),
                available: self
                    .categories
                    .iter()
                    .enumerate()
                    .map(|(i, c)| format!("{} ({})", c.id(), i + 1))
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Select then execute
    pub async fn run(
        &mut self,
        selection: &Selection,
        ctx: Arc<CheckContext>,
    ) -> Result<AuditReport, ConfigError> {
        let selected = self.select(selection)?;
        Ok(self.execute(&selected, ctx).await)
    }

    /// Execute the selected categories and score the result
    pub async fn execute(&mut self, selected: &[usize], ctx: Arc<CheckContext>) -> AuditReport {
        self.transition(RunnerState::Executing);

        let started_at = Utc::now();
        let timer = Timer::start();
        let mut timing = RunTiming::new();
        let mut collector = Collector::new();
        let mut incomplete = false;

        let deadline_guard = self.options.deadline.map(|deadline| {
            let token = self.cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                warn!(deadline_secs = deadline.as_secs(), "Audit deadline reached");
                token.cancel();
            })
        });

        info!(
            project = %ctx.scanner.project_name(),
            categories = selected.len(),
            parallel = self.options.parallel,
            "Starting audit"
        );

        for (position, &index) in selected.iter().enumerate() {
            if self.cancel.is_cancelled() {
                incomplete = true;
                break;
            }

            let category = &self.categories[index];
            if let Some(progress) = &self.progress {
                progress.set_message(format!(
                    "[{}/{}] {}",
                    position + 1,
                    selected.len(),
                    category.title()
                ));
            }
            let span = span!(Level::INFO, "category", category = category.id());
            let category_timer = Timer::start();
            let findings_before = collector.all_findings().len();
            let checks_before = collector.total_checks();

            let completed = self
                .execute_category(category, &ctx, &mut collector)
                .instrument(span)
                .await;

            timing.record(CategoryTiming::new(
                category.id(),
                collector.total_checks() - checks_before,
                collector.all_findings().len() - findings_before,
                category_timer.elapsed(),
            ));

            if !completed {
                incomplete = true;
                break;
            }
        }

        if let Some(guard) = deadline_guard {
            guard.abort();
        }
        if let Some(progress) = &self.progress {
            progress.finish_and_clear();
        }
        if incomplete {
            warn!("Audit cancelled, reporting partial results");
        }

        self.transition(RunnerState::Scoring);
        timing.finish(timer.elapsed());

        let categories = selected
            .iter()
            .map(|&i| CategorySummary {
                id: self.categories[i].id().to_string(),
                title: self.categories[i].title().to_string(),
            })
            .collect();

        let report = AuditReport::from_collector(
            ctx.scanner.project_name(),
            started_at,
            categories,
            &collector,
            &self.scorer,
            self.options.strict,
            incomplete,
            timing,
        );

        info!(
            critical = report.counts.critical,
            high = report.counts.high,
            medium = report.counts.medium,
            low = report.counts.low,
            score = report.score.value,
            grade = %report.score.grade,
            "Audit complete"
        );

        report
    }

    /// Run one category. Returns false when the run was cancelled midway.
    async fn execute_category(
        &self,
        category: &Category,
        ctx: &Arc<CheckContext>,
        collector: &mut Collector,
    ) -> bool {
        let checks: Vec<&Arc<dyn Check>> = category
            .checks()
            .iter()
            .filter(|check| {
                let id = format!("{}/{}", category.id(), check.name());
                let enabled = ctx.config.is_check_enabled(&id);
                if !enabled {
                    debug!(check = %id, "Check disabled by configuration");
                }
                enabled
            })
            .collect();

        debug!(checks = checks.len(), "Running category");

        if !self.options.parallel {
            for check in checks {
                let outcome = run_isolated(
                    Arc::clone(check),
                    Arc::clone(ctx),
                    self.options.check_timeout,
                    self.cancel.clone(),
                )
                .await;
                if matches!(outcome, CheckOutcome::Cancelled) {
                    return false;
                }
                self.apply_outcome(category, check.as_ref(), outcome, ctx, collector)
                    .await;
            }
            return true;
        }

        let mut outcomes = self.execute_parallel(&checks, ctx).await;
        outcomes.sort_by_key(|(index, _)| *index);

        let mut completed = true;
        for (index, outcome) in outcomes {
            if matches!(outcome, CheckOutcome::Cancelled) {
                completed = false;
                continue;
            }
            self.apply_outcome(category, checks[index].as_ref(), outcome, ctx, collector)
                .await;
        }
        completed
    }

    /// Independent checks run concurrently on a bounded pool; checks with
    /// dependencies run afterwards, one at a time, in declaration order.
    async fn execute_parallel(
        &self,
        checks: &[&Arc<dyn Check>],
        ctx: &Arc<CheckContext>,
    ) -> Vec<(usize, CheckOutcome)> {
        let semaphore = Arc::new(Semaphore::new(self.options.jobs.max(1)));
        let (tx, mut rx) = mpsc::channel(checks.len().max(1));

        for (index, check) in checks.iter().enumerate() {
            if !check.depends_on().is_empty() {
                continue;
            }

            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();
            let check = Arc::clone(check);
            let ctx = Arc::clone(ctx);
            let timeout = self.options.check_timeout;
            let cancel = self.cancel.clone();

            tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = run_isolated(check, ctx, timeout, cancel).await;
                let _ = tx.send((index, outcome)).await;
            });
        }
        drop(tx);

        let mut outcomes = Vec::with_capacity(checks.len());
        while let Some(received) = rx.recv().await {
            outcomes.push(received);
        }

        for (index, check) in checks.iter().enumerate() {
            if check.depends_on().is_empty() {
                continue;
            }
            if self.cancel.is_cancelled() {
                outcomes.push((index, CheckOutcome::Cancelled));
                continue;
            }
            let outcome = run_isolated(
                Arc::clone(check),
                Arc::clone(ctx),
                self.options.check_timeout,
                self.cancel.clone(),
            )
            .await;
            outcomes.push((index, outcome));
        }

        outcomes
    }

    /// Record one outcome, attempting the check's remediation under `--fix`
    async fn apply_outcome(
        &self,
        category: &Category,
        check: &dyn Check,
        outcome: CheckOutcome,
        ctx: &CheckContext,
        collector: &mut Collector,
    ) {
        let id = format!("{}/{}", category.id(), check.name());

        match outcome {
            CheckOutcome::Findings(findings) if !findings.is_empty() && self.options.fix => {
                match check.remediation(ctx) {
                    Some(fix) => {
                        let dir = match &fix.working_dir {
                            Some(relative) => ctx.root().join(relative),
                            None => ctx.root().to_path_buf(),
                        };
                        let args: Vec<&str> = fix.args.iter().map(String::as_str).collect();
                        let command = fix.command_line();

                        match ctx.tools.run(fix.tool, &args, &dir).await {
                            ToolOutcome::Completed(result) if result.success() => {
                                info!(check = %id, command = %command, "Automatic fix applied");
                                collector.record_pass(&id);
                            }
                            ToolOutcome::Completed(result) => {
                                warn!(check = %id, command = %command, "Automatic fix failed");
                                collector.record_findings(
                                    &id,
                                    vec![Finding::new(
                                        category.id(),
                                        check.name(),
                                        Severity::High,
                                        format!(
                                            "Automatic fix `{}` failed: {}",
                                            command,
                                            result.summary_line()
                                        ),
                                    )
                                    .with_location(command.clone())],
                                );
                            }
                            ToolOutcome::Unavailable | ToolOutcome::TimedOut(_) => {
                                warn!(check = %id, command = %command, "Automatic fix could not run");
                                collector.record_findings(&id, findings);
                            }
                        }
                    }
                    None => collector.record_findings(&id, findings),
                }
            }
            CheckOutcome::Findings(findings) => {
                debug!(check = %id, findings = findings.len(), "Check completed");
                collector.record_findings(&id, findings);
            }
            CheckOutcome::Skipped(reason) => {
                debug!(check = %id, reason = %reason, "Check skipped");
                collector.record_skip(&id, reason);
            }
            CheckOutcome::Failed(message) => {
                warn!(check = %id, error = %message, "Check failed to execute");
                collector.record_findings(
                    &id,
                    vec![Finding::new(
                        category.id(),
                        check.name(),
                        check.failure_severity(),
                        format!("Check could not complete: {}", message),
                    )],
                );
            }
            CheckOutcome::Cancelled => {}
        }
    }

    /// Enter the reporting phase
    pub fn begin_reporting(&mut self) {
        self.transition(RunnerState::Reporting);
    }

    /// Finish the run and derive the exit code from the recorded counts
    pub fn finish(&mut self, report: &AuditReport) -> i32 {
        self.transition(RunnerState::Done);
        exit_codes::from_counts(&report.counts, self.options.strict)
    }
}

/// Run one check on its own task so a panic or a hang cannot take the
/// runner down with it.
async fn run_isolated(
    check: Arc<dyn Check>,
    ctx: Arc<CheckContext>,
    timeout: Duration,
    cancel: CancellationToken,
) -> CheckOutcome {
    let task = tokio::spawn(async move { tokio::time::timeout(timeout, check.run(&ctx)).await });
    let abort = task.abort_handle();

    tokio::select! {
        _ = cancel.cancelled() => {
            abort.abort();
            CheckOutcome::Cancelled
        }
        joined = task => match joined {
            Ok(Ok(Ok(findings))) => CheckOutcome::Findings(findings),
            Ok(Ok(Err(e))) if e.is_skip() => CheckOutcome::Skipped(e.to_string()),
            Ok(Ok(Err(e))) => CheckOutcome::Failed(e.to_string()),
            Ok(Err(_)) => CheckOutcome::Skipped(format!("timed out after {}s", timeout.as_secs())),
            Err(e) if e.is_panic() => CheckOutcome::Failed("check panicked".to_string()),
            Err(_) => CheckOutcome::Cancelled,
        }
    }
}
