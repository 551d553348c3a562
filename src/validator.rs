//! Pre-flight checklist gating the production server.
//!
//! Checks run in a fixed order: interpreter, `.env` presence, production
//! flag, default-credential rejection. Validation only observes; copying the
//! template over a missing `.env` is a separate step (`bootstrap_env_file`).

use crate::env_file::{ADMIN_PASSWORD_KEY, DEFAULT_ADMIN_PASSWORD, ENVIRONMENT_KEY, EnvRecord, PRODUCTION};
use crate::error::Result;
use crate::runner::{CommandRunner, Invocation};
use crate::settings::LauncherSettings;
use anyhow::Context;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Interpreter,
    EnvFile,
    ProductionMode,
    DefaultPassword,
}

impl Check {
    pub const ORDER: [Check; 4] = [
        Check::Interpreter,
        Check::EnvFile,
        Check::ProductionMode,
        Check::DefaultPassword,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Check::Interpreter => "Python interpreter",
            Check::EnvFile => "Configuration file",
            Check::ProductionMode => "Production mode",
            Check::DefaultPassword => "Admin password",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub check: Check,
    pub passed: bool,
    pub message: String,
}

impl CheckOutcome {
    fn pass(check: Check, message: impl Into<String>) -> Self {
        Self {
            check,
            passed: true,
            message: message.into(),
        }
    }

    fn fail(check: Check, message: impl Into<String>) -> Self {
        Self {
            check,
            passed: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Stop at the first unmet precondition (production launcher)
    Gate,
    /// Run every check that can run and report all of them (diagnostics)
    Survey,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub outcomes: Vec<CheckOutcome>,
    /// Present once `.env` was found and read
    pub record: Option<EnvRecord>,
}

impl Report {
    /// All four checks ran and passed.
    pub fn is_ready(&self) -> bool {
        self.outcomes.len() == Check::ORDER.len() && self.outcomes.iter().all(|o| o.passed)
    }

    pub fn first_failure(&self) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| !o.passed)
    }

    pub fn outcome(&self, check: Check) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| o.check == check)
    }

    #[cfg(test)]
    pub fn checks_run(&self) -> Vec<Check> {
        self.outcomes.iter().map(|o| o.check).collect()
    }
}

/// Content checks over an already loaded record, in checklist order.
pub fn check_record(record: &EnvRecord) -> [CheckOutcome; 2] {
    let production = if record.is_production() {
        CheckOutcome::pass(Check::ProductionMode, "ENVIRONMENT=production")
    } else {
        CheckOutcome::fail(
            Check::ProductionMode,
            format!(
                "{}={} is not a production setting. Set {}={} in .env to start the production server, or use 'diagnose' for a development run.",
                ENVIRONMENT_KEY,
                record.environment(),
                ENVIRONMENT_KEY,
                PRODUCTION
            ),
        )
    };

    let password = if record.uses_default_password() {
        CheckOutcome::fail(
            Check::DefaultPassword,
            format!(
                "SECURITY WARNING: {} is still the default '{}'. Choose a strong password in .env before going live.",
                ADMIN_PASSWORD_KEY, DEFAULT_ADMIN_PASSWORD
            ),
        )
    } else {
        CheckOutcome::pass(Check::DefaultPassword, "custom admin password configured")
    };

    [production, password]
}

pub struct Validator<'a> {
    settings: &'a LauncherSettings,
    project_dir: &'a Path,
}

impl<'a> Validator<'a> {
    pub fn new(settings: &'a LauncherSettings, project_dir: &'a Path) -> Self {
        Self {
            settings,
            project_dir,
        }
    }

    pub fn env_path(&self) -> PathBuf {
        self.project_dir.join(&self.settings.env_file)
    }

    pub async fn run<R: CommandRunner>(&self, runner: &R, mode: Mode) -> Result<Report> {
        let mut report = Report::default();

        let interpreter = self.check_interpreter(runner).await;
        let stop = !interpreter.passed && mode == Mode::Gate;
        report.outcomes.push(interpreter);
        if stop {
            return Ok(report);
        }

        let env_path = self.env_path();
        if !env_path.exists() {
            report.outcomes.push(CheckOutcome::fail(
                Check::EnvFile,
                format!(
                    "{} not found. Copy {} to {} and set {} and {}.",
                    env_path.display(),
                    self.settings.env_template.display(),
                    self.settings.env_file.display(),
                    ADMIN_PASSWORD_KEY,
                    ENVIRONMENT_KEY
                ),
            ));
            return Ok(report);
        }
        let record = match EnvRecord::load(&env_path) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(error = %e, "unreadable .env");
                report.outcomes.push(CheckOutcome::fail(
                    Check::EnvFile,
                    format!(
                        "Cannot read {} ({:#}). Make sure it is a readable text file.",
                        env_path.display(),
                        e
                    ),
                ));
                return Ok(report);
            }
        };
        report.outcomes.push(CheckOutcome::pass(
            Check::EnvFile,
            format!("{} found", env_path.display()),
        ));

        for outcome in check_record(&record) {
            let stop = !outcome.passed && mode == Mode::Gate;
            report.outcomes.push(outcome);
            if stop {
                break;
            }
        }
        report.record = Some(record);

        for outcome in &report.outcomes {
            tracing::debug!(check = outcome.check.label(), passed = outcome.passed, "pre-flight");
        }

        Ok(report)
    }

    async fn check_interpreter<R: CommandRunner>(&self, runner: &R) -> CheckOutcome {
        let probe = Invocation::new(&self.settings.python)
            .arg("--version")
            .captured();

        match runner.run(&probe).await {
            Ok(outcome) if outcome.success() => {
                // Older interpreters print the version on stderr
                let version = [outcome.stdout.trim(), outcome.stderr.trim()]
                    .into_iter()
                    .find(|s| !s.is_empty())
                    .unwrap_or(self.settings.python.as_str())
                    .to_string();
                CheckOutcome::pass(Check::Interpreter, version)
            }
            Ok(outcome) => {
                tracing::debug!(code = ?outcome.code, "interpreter probe failed");
                CheckOutcome::fail(Check::Interpreter, Self::install_hint(&self.settings.python))
            }
            Err(e) => {
                tracing::debug!(error = %e, "interpreter probe could not start");
                CheckOutcome::fail(Check::Interpreter, Self::install_hint(&self.settings.python))
            }
        }
    }

    fn install_hint(python: &str) -> String {
        format!(
            "'{}' is not available. Install Python 3.10 or newer from https://www.python.org/downloads/ (tick \"Add Python to PATH\") and open a new terminal.",
            python
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bootstrap {
    Copied { from: PathBuf, to: PathBuf },
    TemplateMissing(PathBuf),
    /// `.env` already exists and was left alone
    Present(PathBuf),
}

/// First-run helper: puts a copy of the template where `.env` is expected.
pub fn bootstrap_env_file(settings: &LauncherSettings, project_dir: &Path) -> Result<Bootstrap> {
    let target = project_dir.join(&settings.env_file);
    if target.exists() {
        return Ok(Bootstrap::Present(target));
    }

    let template = project_dir.join(&settings.env_template);
    if !template.is_file() {
        return Ok(Bootstrap::TemplateMissing(template));
    }

    std::fs::copy(&template, &target).with_context(|| {
        format!(
            "Failed to copy {} to {}",
            template.display(),
            target.display()
        )
    })?;
    tracing::info!(from = %template.display(), to = %target.display(), "created .env from template");

    Ok(Bootstrap::Copied {
        from: template,
        to: target,
    })
}
