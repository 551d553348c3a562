use std::io::Write;

/// Named groups of tests, one file each under `tests/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suite {
    Security,
    Database,
    Services,
    Integration,
}

impl Suite {
    pub fn name(&self) -> &'static str {
        match self {
            Suite::Security => "security",
            Suite::Database => "database",
            Suite::Services => "services",
            Suite::Integration => "integration",
        }
    }

    pub fn test_file(&self) -> String {
        format!("tests/test_{}.py", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    RunAll,
    RunUnit,
    RunIntegration,
    RunCoverage,
    RunSuite(Suite),
    RunByName(String),
    ImportDiagnostics,
    DependencyCheck,
    CleanCaches,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    Main,
    SpecificTest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    MainMenu,
    SpecificTestMenu,
    /// Free-text prompt for a `-k` filter, reached from the sub-menu
    TestNamePrompt,
    /// Transient: an action executes, then control returns to its menu
    Running { action: Action, return_to: Menu },
    Exit,
}

impl From<Menu> for State {
    fn from(menu: Menu) -> Self {
        match menu {
            Menu::Main => State::MainMenu,
            Menu::SpecificTest => State::SpecificTestMenu,
        }
    }
}

const MAIN_OPTIONS: [(&str, &str); 9] = [
    ("1", "Run all tests"),
    ("2", "Run unit tests (security, database, services)"),
    ("3", "Run integration tests"),
    ("4", "Run tests with coverage report"),
    ("5", "Run a specific test"),
    ("6", "Diagnose integration test imports"),
    ("7", "Check installed dependencies"),
    ("8", "Clean test caches and reports"),
    ("9", "Exit"),
];

const SPECIFIC_OPTIONS: [(&str, &str); 6] = [
    ("1", "Security tests"),
    ("2", "Database tests"),
    ("3", "Services tests"),
    ("4", "Integration tests"),
    ("5", "Tests matching a name"),
    ("6", "Back to main menu"),
];

/// Next state for a main-menu token; `None` means the token is not an option.
pub fn main_transition(token: &str) -> Option<State> {
    let running = |action| State::Running {
        action,
        return_to: Menu::Main,
    };

    let next = match token.trim() {
        "1" => running(Action::RunAll),
        "2" => running(Action::RunUnit),
        "3" => running(Action::RunIntegration),
        "4" => running(Action::RunCoverage),
        "5" => State::SpecificTestMenu,
        "6" => running(Action::ImportDiagnostics),
        "7" => running(Action::DependencyCheck),
        "8" => running(Action::CleanCaches),
        "9" => State::Exit,
        _ => return None,
    };
    Some(next)
}

pub fn specific_transition(token: &str) -> Option<State> {
    let next = match token.trim() {
        "1" => suite_run(Suite::Security),
        "2" => suite_run(Suite::Database),
        "3" => suite_run(Suite::Services),
        "4" => suite_run(Suite::Integration),
        "5" => State::TestNamePrompt,
        "6" => State::MainMenu,
        _ => return None,
    };
    Some(next)
}

/// Empty filters go back to the sub-menu without running anything.
pub fn name_filter_transition(filter: &str) -> State {
    let filter = filter.trim();
    if filter.is_empty() {
        State::SpecificTestMenu
    } else {
        State::Running {
            action: Action::RunByName(filter.to_string()),
            return_to: Menu::SpecificTest,
        }
    }
}

fn suite_run(suite: Suite) -> State {
    State::Running {
        action: Action::RunSuite(suite),
        return_to: Menu::SpecificTest,
    }
}

pub fn render_main<W: Write>(out: &mut W) -> std::io::Result<()> {
    render(out, "NASST Digital - Test Runner", &MAIN_OPTIONS)
}

pub fn render_specific<W: Write>(out: &mut W) -> std::io::Result<()> {
    render(out, "Run a specific test", &SPECIFIC_OPTIONS)
}

fn render<W: Write>(out: &mut W, title: &str, options: &[(&str, &str)]) -> std::io::Result<()> {
    let rule = "=".repeat(50);
    writeln!(out)?;
    writeln!(out, "{}", rule)?;
    writeln!(out, "  {}", title)?;
    writeln!(out, "{}", rule)?;
    writeln!(out)?;
    for (key, label) in options {
        writeln!(out, "  [{}] {}", key, label)?;
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_main_option_is_mapped() {
        for (key, _) in MAIN_OPTIONS {
            assert!(main_transition(key).is_some(), "option {} unmapped", key);
        }
        assert_eq!(main_transition("5"), Some(State::SpecificTestMenu));
        assert_eq!(main_transition("9"), Some(State::Exit));
    }

    #[test]
    fn test_main_actions_return_to_main_menu() {
        assert_eq!(
            main_transition(" 1 "),
            Some(State::Running {
                action: Action::RunAll,
                return_to: Menu::Main
            })
        );
        assert_eq!(
            main_transition("8"),
            Some(State::Running {
                action: Action::CleanCaches,
                return_to: Menu::Main
            })
        );
    }

    #[test]
    fn test_unrecognized_main_tokens() {
        for token in ["", "0", "10", "a", "1 2", "９", "exit", "-1"] {
            assert_eq!(main_transition(token), None, "token {:?}", token);
        }
    }

    #[test]
    fn test_specific_menu_transitions() {
        assert_eq!(
            specific_transition("2"),
            Some(State::Running {
                action: Action::RunSuite(Suite::Database),
                return_to: Menu::SpecificTest
            })
        );
        assert_eq!(specific_transition("5"), Some(State::TestNamePrompt));
        assert_eq!(specific_transition("6"), Some(State::MainMenu));
        assert_eq!(specific_transition("7"), None);
        assert_eq!(specific_transition("9"), None);
    }

    #[test]
    fn test_name_filter_transition() {
        assert_eq!(name_filter_transition("   "), State::SpecificTestMenu);
        assert_eq!(
            name_filter_transition(" test_login "),
            State::Running {
                action: Action::RunByName("test_login".to_string()),
                return_to: Menu::SpecificTest
            }
        );
    }

    #[test]
    fn test_suite_files() {
        let files: Vec<String> = [
            Suite::Security,
            Suite::Database,
            Suite::Services,
            Suite::Integration,
        ]
        .iter()
        .map(Suite::test_file)
        .collect();
        assert_eq!(
            files,
            vec![
                "tests/test_security.py",
                "tests/test_database.py",
                "tests/test_services.py",
                "tests/test_integration.py",
            ]
        );
    }

    #[test]
    fn test_render_main_lists_nine_options() {
        let mut out = Vec::new();
        render_main(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[1] Run all tests"));
        assert!(text.contains("[9] Exit"));
        assert_eq!(text.matches("  [").count(), 9);
    }
}
