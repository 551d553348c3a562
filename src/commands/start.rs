use super::{Bind, hand_off, print_report, server_invocation};
use crate::env_file::{ADMIN_PASSWORD_KEY, ENVIRONMENT_KEY, PRODUCTION};
use crate::error::Result;
use crate::runner::CommandRunner;
use crate::settings::LauncherSettings;
use crate::validator::{Bootstrap, Check, Mode, Validator, bootstrap_env_file};
use std::io::Write;
use std::path::Path;

/// Returns whether the application was started.
pub async fn start_command<R, W>(
    runner: &R,
    settings: &LauncherSettings,
    project_dir: &Path,
    out: &mut W,
) -> Result<bool>
where
    R: CommandRunner,
    W: Write,
{
    writeln!(out, "NASST Digital - starting in production mode")?;
    writeln!(out)?;

    let report = Validator::new(settings, project_dir)
        .run(runner, Mode::Gate)
        .await?;
    print_report(out, &report, "❌")?;

    if !report.is_ready() {
        if let Some(failure) = report.first_failure() {
            tracing::warn!(check = failure.check.label(), "pre-flight check failed");
            if failure.check == Check::EnvFile {
                bootstrap(settings, project_dir, out)?;
            }
        }
        return Ok(false);
    }

    writeln!(out)?;
    writeln!(
        out,
        "Serving on http://{}:{}",
        settings.server.address, settings.server.port
    )?;
    let invocation = server_invocation(settings, project_dir, Bind::Production);
    hand_off(runner, &invocation, out).await
}

fn bootstrap<W: Write>(settings: &LauncherSettings, project_dir: &Path, out: &mut W) -> Result<()> {
    writeln!(out)?;
    match bootstrap_env_file(settings, project_dir)? {
        Bootstrap::Copied { from, to } => {
            writeln!(out, "Created {} from {}.", to.display(), from.display())?;
            writeln!(out, "Edit it before starting again:")?;
            writeln!(out, "  1. {}=<a strong password>", ADMIN_PASSWORD_KEY)?;
            writeln!(out, "  2. {}={}", ENVIRONMENT_KEY, PRODUCTION)?;
        }
        Bootstrap::TemplateMissing(template) => {
            writeln!(
                out,
                "Template {} not found either; create {} by hand with {} and {}.",
                template.display(),
                settings.env_file.display(),
                ADMIN_PASSWORD_KEY,
                ENVIRONMENT_KEY
            )?;
        }
        Bootstrap::Present(_) => {}
    }
    Ok(())
}
