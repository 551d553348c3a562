//! What each test-menu action runs. Test runs and probes go through the
//! `CommandRunner`; file inspection and cleanup touch the project directly.

use std::io::Write;
use std::path::{Path, PathBuf};

use super::menu::{Action, Suite};
use anyhow::Context;
use crate::error::Result;
use crate::runner::{CommandRunner, Invocation};
use crate::settings::LauncherSettings;

const TESTS_DIR: &str = "tests/";
const UNIT_SUITES: [Suite; 3] = [Suite::Security, Suite::Database, Suite::Services];
const VERBOSE: &str = "-v";
const SHORT_TRACEBACK: &str = "--tb=short";
const UNIT_MAX_FAILURES: &str = "--maxfail=5";
const NO_WARNINGS: &str = "--disable-warnings";

pub const COVERAGE_SOURCES: [&str; 3] = ["core", "pages", "ui"];
pub const HTML_REPORT_DIR: &str = "htmlcov";
pub const COVERAGE_DATA_FILE: &str = ".coverage";
pub const PYTEST_CACHE_DIR: &str = ".pytest_cache";

pub const PROBED_LIBRARIES: [&str; 5] = ["streamlit", "pandas", "plotly", "pytest", "dotenv"];

const IMPORT_PATTERN: &str = "from core";
const IMPORT_GUIDANCE: [&str; 7] = [
    "Services no longer live in core.services; import each one from its own module:",
    "  from core.servidor_service import ServidoresService",
    "  from core.vacinacao_service import VacinacaoService",
    "  from core.campanha_service import CampanhasService",
    "  from core.relatorio_service import RelatoriosService, RelatoriosGerenciaisService",
    "  from core.auth_service import AuditLog, Auth",
    "Run the tests from the project root so that 'core' is importable.",
];

/// A line of a test file that imports from the application package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportLine {
    pub number: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryStatus {
    pub name: String,
    pub installed: bool,
}

pub struct TestBench<'a> {
    settings: &'a LauncherSettings,
    project_dir: &'a Path,
}

impl<'a> TestBench<'a> {
    pub fn new(settings: &'a LauncherSettings, project_dir: &'a Path) -> Self {
        Self {
            settings,
            project_dir,
        }
    }

    /// pytest arguments for the actions that are plain test runs.
    pub fn pytest_args(action: &Action) -> Option<Vec<String>> {
        let mut args: Vec<String> = match action {
            Action::RunAll => vec![TESTS_DIR.to_string()],
            Action::RunUnit => UNIT_SUITES.iter().map(Suite::test_file).collect(),
            Action::RunIntegration => vec![Suite::Integration.test_file()],
            Action::RunSuite(suite) => vec![suite.test_file()],
            Action::RunByName(filter) => vec![TESTS_DIR.to_string(), "-k".to_string(), filter.clone()],
            Action::RunCoverage => {
                let mut args = vec![TESTS_DIR.to_string()];
                args.extend(COVERAGE_SOURCES.iter().map(|src| format!("--cov={}", src)));
                args.push("--cov-report=term-missing".to_string());
                args.push("--cov-report=html".to_string());
                return Some(args);
            }
            Action::ImportDiagnostics | Action::DependencyCheck | Action::CleanCaches => {
                return None;
            }
        };

        args.push(VERBOSE.to_string());
        args.push(SHORT_TRACEBACK.to_string());
        match action {
            Action::RunUnit => args.push(UNIT_MAX_FAILURES.to_string()),
            Action::RunIntegration => args.push(NO_WARNINGS.to_string()),
            _ => {}
        }
        Some(args)
    }

    fn pytest(&self, args: Vec<String>) -> Invocation {
        Invocation::new(&self.settings.python)
            .args(["-m", "pytest"])
            .args(args)
            .current_dir(self.project_dir)
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.project_dir.join(relative)
    }

    /// Runs pytest for a test-run action and prints the verdict banner.
    /// Returns whether the run passed.
    pub async fn run_tests<R, W>(&self, runner: &R, out: &mut W, action: &Action) -> Result<bool>
    where
        R: CommandRunner,
        W: Write,
    {
        let Some(args) = Self::pytest_args(action) else {
            return Ok(false);
        };
        let invocation = self.pytest(args);

        writeln!(out, "Running: {}", invocation)?;
        writeln!(out, "(Ctrl+C interrupts a long run)")?;
        writeln!(out)?;
        out.flush()?;

        let passed = match runner.run(&invocation).await {
            Ok(outcome) if outcome.success() => {
                writeln!(out)?;
                writeln!(out, "✅ TESTS PASSED")?;
                true
            }
            Ok(outcome) => {
                writeln!(out)?;
                match outcome.code {
                    Some(code) => writeln!(out, "❌ TESTS FAILED (exit code {})", code)?,
                    None => writeln!(out, "❌ TESTS FAILED (interrupted)")?,
                }
                false
            }
            Err(e) => {
                writeln!(out, "❌ TESTS FAILED: {}", e)?;
                false
            }
        };
        tracing::info!(command = %invocation, passed, "test run finished");
        Ok(passed)
    }

    pub async fn run_coverage<R, W>(&self, runner: &R, out: &mut W) -> Result<bool>
    where
        R: CommandRunner,
        W: Write,
    {
        let passed = self.run_tests(runner, out, &Action::RunCoverage).await?;
        if !passed {
            return Ok(false);
        }

        let index = self.path(HTML_REPORT_DIR).join("index.html");
        if !index.is_file() {
            writeln!(out, "HTML report not found at {}", index.display())?;
            return Ok(true);
        }

        writeln!(out, "HTML report: {}", index.display())?;
        let viewer = viewer_invocation(&index).captured();
        match runner.run(&viewer).await {
            Ok(outcome) if outcome.success() => writeln!(out, "Opened the report in the default viewer.")?,
            _ => writeln!(out, "Could not open a viewer; open the file above manually.")?,
        }
        Ok(true)
    }

    /// Lines of the integration test file importing from `core`, or `None`
    /// when the file does not exist.
    pub fn scan_imports(&self) -> Result<Option<Vec<ImportLine>>> {
        let file = self.path(&Suite::Integration.test_file());
        if !file.exists() {
            return Ok(None);
        }

        // Test files saved by Windows editors are often Latin-1
        let bytes = std::fs::read(&file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let lines = String::from_utf8_lossy(&bytes)
            .lines()
            .enumerate()
            .filter(|(_, line)| line.contains(IMPORT_PATTERN))
            .map(|(index, line)| ImportLine {
                number: index + 1,
                text: line.to_string(),
            })
            .collect();
        Ok(Some(lines))
    }

    pub fn show_import_diagnostics<W: Write>(&self, out: &mut W) -> Result<()> {
        let file = Suite::Integration.test_file();
        writeln!(out, "Checking imports in {}", file)?;
        writeln!(out)?;

        match self.scan_imports()? {
            Some(lines) if lines.is_empty() => {
                writeln!(out, "No '{}' imports found.", IMPORT_PATTERN)?;
            }
            Some(lines) => {
                for line in lines {
                    writeln!(out, "  {:>4}: {}", line.number, line.text)?;
                }
            }
            None => writeln!(out, "⚠️  {} not found.", file)?,
        }

        writeln!(out)?;
        for line in IMPORT_GUIDANCE {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }

    /// Probes every library even after a miss. Returns `None` when the
    /// interpreter itself is unavailable.
    pub async fn check_dependencies<R, W>(
        &self,
        runner: &R,
        out: &mut W,
    ) -> Result<Option<Vec<LibraryStatus>>>
    where
        R: CommandRunner,
        W: Write,
    {
        let version = Invocation::new(&self.settings.python)
            .arg("--version")
            .captured();
        match runner.run(&version).await {
            Ok(outcome) if outcome.success() => {
                let text = if outcome.stdout.trim().is_empty() {
                    outcome.stderr.trim().to_string()
                } else {
                    outcome.stdout.trim().to_string()
                };
                writeln!(out, "✅ {}", text)?;
            }
            _ => {
                writeln!(out, "❌ '{}' not found. Install Python first.", self.settings.python)?;
                return Ok(None);
            }
        }

        let mut statuses = Vec::with_capacity(PROBED_LIBRARIES.len());
        for name in PROBED_LIBRARIES {
            let probe = Invocation::new(&self.settings.python)
                .arg("-c")
                .arg(format!("import {}", name))
                .current_dir(self.project_dir)
                .captured();

            let installed = matches!(runner.run(&probe).await, Ok(outcome) if outcome.success());
            if installed {
                writeln!(out, "  ✅ {:<10} installed", name)?;
            } else {
                writeln!(out, "  ❌ {:<10} missing", name)?;
            }
            statuses.push(LibraryStatus {
                name: name.to_string(),
                installed,
            });
        }

        if statuses.iter().any(|s| !s.installed) {
            writeln!(out)?;
            writeln!(out, "Install missing packages with: {} -m pip install -r requirements.txt", self.settings.python)?;
        }
        Ok(Some(statuses))
    }

    /// Removes the pytest cache, the HTML report and the coverage data.
    /// Returns the artifacts that were removed.
    pub fn clean_caches<W: Write>(&self, out: &mut W) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();

        for name in [PYTEST_CACHE_DIR, HTML_REPORT_DIR, COVERAGE_DATA_FILE] {
            let path = self.path(name);
            let result = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else if path.exists() {
                std::fs::remove_file(&path)
            } else {
                continue;
            };

            match result {
                Ok(()) => {
                    writeln!(out, "  Removed {}", name)?;
                    removed.push(path);
                }
                Err(e) => writeln!(out, "  ⚠️  Could not remove {}: {}", name, e)?,
            }
        }

        if removed.is_empty() {
            writeln!(out, "Nothing to clean.")?;
        }
        writeln!(out, "✅ Cleanup complete.")?;
        Ok(removed)
    }
}

fn viewer_invocation(target: &Path) -> Invocation {
    let target = target.to_string_lossy().into_owned();
    if cfg!(target_os = "windows") {
        Invocation::new("cmd").args(["/C", "start", ""]).arg(target)
    } else if cfg!(target_os = "macos") {
        Invocation::new("open").arg(target)
    } else {
        Invocation::new("xdg-open").arg(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::scripted::{Response, ScriptedRunner};
    use std::fs;
    use tempfile::tempdir;

    fn args(action: Action) -> Vec<String> {
        TestBench::pytest_args(&action).unwrap()
    }

    #[test]
    fn test_pytest_args_per_action() {
        assert_eq!(args(Action::RunAll), vec!["tests/", "-v", "--tb=short"]);
        assert_eq!(
            args(Action::RunUnit),
            vec![
                "tests/test_security.py",
                "tests/test_database.py",
                "tests/test_services.py",
                "-v",
                "--tb=short",
                "--maxfail=5"
            ]
        );
        assert_eq!(
            args(Action::RunIntegration),
            vec!["tests/test_integration.py", "-v", "--tb=short", "--disable-warnings"]
        );
        assert_eq!(
            args(Action::RunByName("vacinacao".to_string())),
            vec!["tests/", "-k", "vacinacao", "-v", "--tb=short"]
        );
        assert_eq!(
            args(Action::RunCoverage),
            vec![
                "tests/",
                "--cov=core",
                "--cov=pages",
                "--cov=ui",
                "--cov-report=term-missing",
                "--cov-report=html"
            ]
        );
        assert!(TestBench::pytest_args(&Action::CleanCaches).is_none());
    }

    #[tokio::test]
    async fn test_run_tests_pass_banner() {
        let dir = tempdir().unwrap();
        let settings = LauncherSettings::default();
        let bench = TestBench::new(&settings, dir.path());
        let runner = ScriptedRunner::new().respond("pytest", Response::Exit(0));
        let mut out = Vec::new();

        let passed = bench.run_tests(&runner, &mut out, &Action::RunAll).await.unwrap();

        assert!(passed);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("✅ TESTS PASSED"));
        let call = &runner.calls()[0];
        assert_eq!(call.to_string(), "python -m pytest tests/ -v --tb=short");
        assert_eq!(call.working_dir.as_deref(), Some(dir.path()));
    }

    #[tokio::test]
    async fn test_run_tests_fail_banner() {
        let dir = tempdir().unwrap();
        let settings = LauncherSettings::default();
        let bench = TestBench::new(&settings, dir.path());
        let runner = ScriptedRunner::new().respond("pytest", Response::Exit(1));
        let mut out = Vec::new();

        let passed = bench
            .run_tests(&runner, &mut out, &Action::RunSuite(Suite::Security))
            .await
            .unwrap();

        assert!(!passed);
        assert!(String::from_utf8(out).unwrap().contains("❌ TESTS FAILED (exit code 1)"));
    }

    #[tokio::test]
    async fn test_coverage_opens_existing_report() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("htmlcov")).unwrap();
        fs::write(dir.path().join("htmlcov/index.html"), "<html></html>").unwrap();
        let settings = LauncherSettings::default();
        let bench = TestBench::new(&settings, dir.path());
        let runner = ScriptedRunner::new();
        let mut out = Vec::new();

        assert!(bench.run_coverage(&runner, &mut out).await.unwrap());

        let calls = runner.rendered_calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].contains("--cov=core"));
        assert!(calls[1].contains("index.html"));
    }

    #[tokio::test]
    async fn test_coverage_without_report_or_on_failure_opens_nothing() {
        let dir = tempdir().unwrap();
        let settings = LauncherSettings::default();
        let bench = TestBench::new(&settings, dir.path());

        let runner = ScriptedRunner::new();
        let mut out = Vec::new();
        assert!(bench.run_coverage(&runner, &mut out).await.unwrap());
        assert_eq!(runner.calls().len(), 1);
        assert!(String::from_utf8(out).unwrap().contains("HTML report not found"));

        fs::create_dir_all(dir.path().join("htmlcov")).unwrap();
        fs::write(dir.path().join("htmlcov/index.html"), "").unwrap();
        let failing = ScriptedRunner::new().respond("pytest", Response::Exit(2));
        let mut out = Vec::new();
        assert!(!bench.run_coverage(&failing, &mut out).await.unwrap());
        assert_eq!(failing.calls().len(), 1);
    }

    #[test]
    fn test_scan_imports_reports_line_numbers() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("tests")).unwrap();
        fs::write(
            dir.path().join("tests/test_integration.py"),
            "import pytest\nfrom core.servidor_service import ServidoresService\n\nfrom core.security import Security\n",
        )
        .unwrap();
        let settings = LauncherSettings::default();
        let bench = TestBench::new(&settings, dir.path());

        let lines = bench.scan_imports().unwrap().unwrap();
        assert_eq!(
            lines.iter().map(|l| l.number).collect::<Vec<_>>(),
            vec![2, 4]
        );
        assert!(lines[0].text.contains("servidor_service"));
    }

    #[test]
    fn test_scan_imports_tolerates_latin1_files() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("tests")).unwrap();
        fs::write(
            dir.path().join("tests/test_integration.py"),
            b"# configura\xe7\xe3o\nfrom core.services import ServidoresService\n",
        )
        .unwrap();
        let settings = LauncherSettings::default();
        let bench = TestBench::new(&settings, dir.path());

        let lines = bench.scan_imports().unwrap().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].number, 2);
        assert_eq!(lines[0].text, "from core.services import ServidoresService");
    }

    #[test]
    fn test_import_diagnostics_with_missing_file_still_prints_guidance() {
        let dir = tempdir().unwrap();
        let settings = LauncherSettings::default();
        let bench = TestBench::new(&settings, dir.path());
        let mut out = Vec::new();

        bench.show_import_diagnostics(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("tests/test_integration.py not found"));
        assert!(text.contains("core.services"));
    }

    #[tokio::test]
    async fn test_dependency_check_probes_every_library() {
        let dir = tempdir().unwrap();
        let settings = LauncherSettings::default();
        let bench = TestBench::new(&settings, dir.path());
        let runner = ScriptedRunner::new()
            .respond("--version", Response::Output(0, "Python 3.11.9"))
            .respond("import streamlit", Response::Exit(1))
            .respond("import plotly", Response::Exit(1));
        let mut out = Vec::new();

        let statuses = bench
            .check_dependencies(&runner, &mut out)
            .await
            .unwrap()
            .unwrap();

        let installed: Vec<(&str, bool)> = statuses
            .iter()
            .map(|s| (s.name.as_str(), s.installed))
            .collect();
        assert_eq!(
            installed,
            vec![
                ("streamlit", false),
                ("pandas", true),
                ("plotly", false),
                ("pytest", true),
                ("dotenv", true)
            ]
        );
        // version probe plus one probe per library
        assert_eq!(runner.calls().len(), 6);
        assert!(String::from_utf8(out).unwrap().contains("pip install"));
    }

    #[tokio::test]
    async fn test_dependency_check_without_interpreter() {
        let dir = tempdir().unwrap();
        let settings = LauncherSettings::default();
        let bench = TestBench::new(&settings, dir.path());
        let runner = ScriptedRunner::new().respond("--version", Response::NotFound);
        let mut out = Vec::new();

        let statuses = bench.check_dependencies(&runner, &mut out).await.unwrap();

        assert!(statuses.is_none());
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_clean_caches_removes_artifacts() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".pytest_cache/v/cache")).unwrap();
        fs::create_dir_all(dir.path().join("htmlcov")).unwrap();
        fs::write(dir.path().join(".coverage"), "data").unwrap();
        let settings = LauncherSettings::default();
        let bench = TestBench::new(&settings, dir.path());
        let mut out = Vec::new();

        let removed = bench.clean_caches(&mut out).unwrap();

        assert_eq!(removed.len(), 3);
        assert!(!dir.path().join(".pytest_cache").exists());
        assert!(!dir.path().join("htmlcov").exists());
        assert!(!dir.path().join(".coverage").exists());
    }

    #[test]
    fn test_clean_caches_is_a_no_op_when_clean() {
        let dir = tempdir().unwrap();
        let settings = LauncherSettings::default();
        let bench = TestBench::new(&settings, dir.path());
        let mut out = Vec::new();

        let removed = bench.clean_caches(&mut out).unwrap();
        assert!(removed.is_empty());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Nothing to clean."));
        assert!(text.contains("Cleanup complete."));

        // second run is just as quiet
        assert!(bench.clean_caches(&mut Vec::new()).unwrap().is_empty());
    }
}
