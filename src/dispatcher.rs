//! Interactive test console: a menu state machine over stdin/stdout.

pub mod actions;
pub mod console;
pub mod menu;

use std::io::{BufRead, Write};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::runner::CommandRunner;
use crate::settings::LauncherSettings;
use actions::TestBench;
use console::Console;
use menu::{Action, State};

pub struct Dispatcher<'a, R, I, O> {
    runner: &'a R,
    bench: TestBench<'a>,
    console: Console<I, O>,
    invalid_option_pause: Duration,
}

impl<'a, R, I, O> Dispatcher<'a, R, I, O>
where
    R: CommandRunner,
    I: BufRead,
    O: Write,
{
    pub fn new(
        runner: &'a R,
        settings: &'a LauncherSettings,
        project_dir: &'a Path,
        console: Console<I, O>,
    ) -> Self {
        Self {
            runner,
            bench: TestBench::new(settings, project_dir),
            console,
            invalid_option_pause: Duration::from_millis(settings.invalid_option_pause_ms),
        }
    }

    #[cfg(test)]
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.invalid_option_pause = pause;
        self
    }

    /// Loops until the operator chooses Exit or closes the input.
    pub async fn run(&mut self) -> Result<()> {
        let mut state = State::MainMenu;

        loop {
            tracing::debug!(?state, "test menu");
            state = match state {
                State::MainMenu => {
                    menu::render_main(&mut self.console.out)?;
                    self.select("Choose an option [1-9]: ", menu::main_transition)
                        .await?
                        .unwrap_or(State::MainMenu)
                }
                State::SpecificTestMenu => {
                    menu::render_specific(&mut self.console.out)?;
                    self.select("Choose an option [1-6]: ", menu::specific_transition)
                        .await?
                        .unwrap_or(State::SpecificTestMenu)
                }
                State::TestNamePrompt => {
                    match self.console.prompt("Test name or -k expression (empty to go back): ")? {
                        Some(filter) => menu::name_filter_transition(&filter),
                        None => State::Exit,
                    }
                }
                State::Running { action, return_to } => {
                    // a failed action ends that action only
                    if let Err(e) = self.execute(&action).await {
                        tracing::warn!(?action, error = %e, "menu action failed");
                        writeln!(self.console.out)?;
                        writeln!(self.console.out, "❌ {:#}", e)?;
                    }
                    writeln!(self.console.out)?;
                    if self.console.acknowledge()? {
                        return_to.into()
                    } else {
                        State::Exit
                    }
                }
                State::Exit => break,
            };
        }

        writeln!(self.console.out, "Goodbye.")?;
        Ok(())
    }

    /// `Ok(None)` for an unrecognized token, after the pause.
    async fn select<F>(&mut self, prompt: &str, transition: F) -> Result<Option<State>>
    where
        F: Fn(&str) -> Option<State>,
    {
        let Some(token) = self.console.prompt(prompt)? else {
            return Ok(Some(State::Exit));
        };

        match transition(&token) {
            Some(next) => Ok(Some(next)),
            None => {
                tracing::debug!(%token, "unrecognized menu option");
                writeln!(self.console.out, "Invalid option: '{}'", token.trim())?;
                self.console.out.flush()?;
                tokio::time::sleep(self.invalid_option_pause).await;
                Ok(None)
            }
        }
    }

    async fn execute(&mut self, action: &Action) -> Result<()> {
        writeln!(self.console.out)?;
        let out = &mut self.console.out;

        match action {
            Action::RunCoverage => {
                self.bench.run_coverage(self.runner, out).await?;
            }
            Action::ImportDiagnostics => self.bench.show_import_diagnostics(out)?,
            Action::DependencyCheck => {
                self.bench.check_dependencies(self.runner, out).await?;
            }
            Action::CleanCaches => {
                self.bench.clean_caches(out)?;
            }
            Action::RunAll
            | Action::RunUnit
            | Action::RunIntegration
            | Action::RunSuite(_)
            | Action::RunByName(_) => {
                self.bench.run_tests(self.runner, out, action).await?;
            }
        }
        Ok(())
    }
}
