use super::{Bind, hand_off, print_report, server_invocation};
use crate::error::Result;
use crate::runner::CommandRunner;
use crate::settings::LauncherSettings;
use crate::validator::{Check, Mode, Validator};
use std::io::Write;
use std::path::Path;

/// Diagnostic launcher: reports every check as a warning and starts the
/// application on its default bind as long as Python is available.
pub async fn diagnose_command<R, W>(
    runner: &R,
    settings: &LauncherSettings,
    project_dir: &Path,
    out: &mut W,
) -> Result<bool>
where
    R: CommandRunner,
    W: Write,
{
    writeln!(out, "NASST Digital - diagnostic start")?;
    writeln!(out, "Project directory: {}", project_dir.display())?;
    writeln!(out)?;

    let report = Validator::new(settings, project_dir)
        .run(runner, Mode::Survey)
        .await?;
    print_report(out, &report, "⚠️ ")?;

    let app_entry = project_dir.join(&settings.app_entry);
    if !app_entry.is_file() {
        writeln!(out, "⚠️  {} not found", app_entry.display())?;
    }

    if let Some(record) = &report.record {
        if record.is_production() && record.debug() {
            writeln!(out, "⚠️  DEBUG=true in a production configuration")?;
        }
        if record.is_streamlit_cloud() {
            writeln!(out, "ℹ️  STREAMLIT_CLOUD=true: the application will use its cloud settings")?;
        }
        writeln!(out, "ℹ️  Admin login: {}", record.admin_login())?;
    }

    let interpreter_ok = report
        .outcome(Check::Interpreter)
        .is_some_and(|o| o.passed);
    if !interpreter_ok {
        writeln!(out)?;
        writeln!(out, "Cannot start without Python.")?;
        return Ok(false);
    }

    writeln!(out)?;
    let invocation = server_invocation(settings, project_dir, Bind::Default);
    hand_off(runner, &invocation, out).await
}
