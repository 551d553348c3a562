use clap::{Parser, Subcommand};
use std::{io, path::PathBuf, process::ExitCode};

mod commands;
mod dispatcher;
mod env_file;
mod error;
mod runner;
mod settings;
mod validator;

use runner::ProcessRunner;
use settings::LauncherSettings;

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version)]
#[command(about = "NASST Digital - production launcher, diagnostics and test console")]
#[command(disable_help_subcommand = true)]
struct Cli {
    /// Application root holding app.py, .env and tests/
    #[arg(short, long, global = true, default_value = ".")]
    project_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the environment and start the server for production use
    Start,
    /// Report every check and start the server on its default bind
    Diagnose,
    /// Open the interactive test menu
    Test,
    /// Manage the launcher settings file
    Config {
        /// Show current settings
        #[arg(long)]
        show: bool,
        /// Reset to default settings
        #[arg(long)]
        reset: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> crate::error::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = LauncherSettings::load()?;
    let runner = ProcessRunner;
    let project_dir = cli.project_dir;

    tracing::debug!(project_dir = %project_dir.display(), python = %settings.python, "launcher ready");

    match cli.command {
        Commands::Start => {
            let launched =
                commands::start::start_command(&runner, &settings, &project_dir, &mut io::stdout())
                    .await?;
            Ok(exit_code(launched))
        }
        Commands::Diagnose => {
            let launched = commands::diagnose::diagnose_command(
                &runner,
                &settings,
                &project_dir,
                &mut io::stdout(),
            )
            .await?;
            Ok(exit_code(launched))
        }
        Commands::Test => {
            commands::test::test_command(&runner, &settings, &project_dir).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { show, reset } => {
            commands::config::config_command(show, reset, &settings).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(launched: bool) -> ExitCode {
    if launched {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
