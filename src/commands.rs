use crate::error::Result;
use crate::runner::{CommandRunner, Invocation};
use crate::settings::LauncherSettings;
use crate::validator::{CheckOutcome, Report};
use std::io::Write;
use std::path::Path;

pub mod config;
pub mod diagnose;
pub mod start;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bind {
    /// Explicit port and address from the settings
    Production,
    /// Whatever the server picks by default
    Default,
}

pub fn server_invocation(settings: &LauncherSettings, project_dir: &Path, bind: Bind) -> Invocation {
    let invocation = Invocation::new(&settings.streamlit)
        .arg("run")
        .arg(settings.app_entry.to_string_lossy())
        .current_dir(project_dir);

    match bind {
        Bind::Production => invocation
            .arg("--server.port")
            .arg(settings.server.port.to_string())
            .arg("--server.address")
            .arg(&settings.server.address),
        Bind::Default => invocation,
    }
}

/// Runs the web application in the foreground. Once the server exits,
/// for whatever reason, the operator gets the same notice. `false` only
/// when the server program could not be started.
async fn hand_off<R, W>(runner: &R, invocation: &Invocation, out: &mut W) -> Result<bool>
where
    R: CommandRunner,
    W: Write,
{
    writeln!(out, "Executing: {}", invocation)?;
    writeln!(out, "Press Ctrl+C to stop the server.")?;
    writeln!(out)?;
    out.flush()?;

    let result = runner.run(invocation).await;
    writeln!(out)?;

    match result {
        Ok(outcome) => {
            tracing::info!(code = ?outcome.code, "application exited");
            writeln!(out, "Program ended.")?;
            Ok(true)
        }
        Err(e) => {
            writeln!(out, "❌ {}", e)?;
            writeln!(out, "Is streamlit installed? Try: pip install -r requirements.txt")?;
            Ok(false)
        }
    }
}

fn print_outcome<W: Write>(out: &mut W, outcome: &CheckOutcome, failure_mark: &str) -> Result<()> {
    let mark = if outcome.passed { "✅" } else { failure_mark };
    writeln!(out, "{} {}: {}", mark, outcome.check.label(), outcome.message)?;
    Ok(())
}

fn print_report<W: Write>(out: &mut W, report: &Report, failure_mark: &str) -> Result<()> {
    for outcome in &report.outcomes {
        print_outcome(out, outcome, failure_mark)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_production_server_invocation() {
        let settings = LauncherSettings::default();
        let invocation = server_invocation(&settings, Path::new("/srv/nasst"), Bind::Production);

        assert_eq!(
            invocation.to_string(),
            "streamlit run app.py --server.port 8501 --server.address 0.0.0.0"
        );
        assert_eq!(invocation.working_dir, Some(PathBuf::from("/srv/nasst")));
    }

    #[test]
    fn test_default_bind_has_no_network_arguments() {
        let settings = LauncherSettings::default();
        let invocation = server_invocation(&settings, Path::new("."), Bind::Default);

        assert_eq!(invocation.args, vec!["run", "app.py"]);
    }
}
