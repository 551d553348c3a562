use crate::error::{Error, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{
    env,
    path::{Path, PathBuf},
};

const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");

/// Overrides the interpreter named in the settings file.
pub const PYTHON_ENV_VAR: &str = "NASST_PYTHON";

/// Shape of `[package.metadata.settings.defaults]`, embedded by build.rs.
#[derive(Debug, Deserialize)]
struct EmbeddedDefaults {
    app_config_path: Vec<String>,
    config_file_name: String,
    python: String,
    streamlit: String,
    app_entry: String,
    env_file: String,
    env_template: String,
    server_port: u16,
    server_address: String,
    invalid_option_pause_ms: u64,
}

impl EmbeddedDefaults {
    fn load() -> Option<Self> {
        serde_json::from_str(env!("LAUNCHER_DEFAULTS_JSON")).ok()
    }
}

/// Launcher settings. Paths are relative to the project directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LauncherSettings {
    /// Interpreter used for the presence check, pytest and import probes
    pub python: String,
    /// Program that serves the web application
    pub streamlit: String,
    pub app_entry: PathBuf,
    pub env_file: PathBuf,
    /// Copied over `env_file` on first run
    pub env_template: PathBuf,
    pub server: ServerBinding,
    pub invalid_option_pause_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerBinding {
    pub port: u16,
    pub address: String,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        match EmbeddedDefaults::load() {
            Some(defaults) => Self {
                python: defaults.python,
                streamlit: defaults.streamlit,
                app_entry: PathBuf::from(defaults.app_entry),
                env_file: PathBuf::from(defaults.env_file),
                env_template: PathBuf::from(defaults.env_template),
                server: ServerBinding {
                    port: defaults.server_port,
                    address: defaults.server_address,
                },
                invalid_option_pause_ms: defaults.invalid_option_pause_ms,
            },
            None => Self {
                python: "python".to_string(),
                streamlit: "streamlit".to_string(),
                app_entry: PathBuf::from("app.py"),
                env_file: PathBuf::from(".env"),
                env_template: PathBuf::from(".env.example"),
                server: ServerBinding {
                    port: 8501,
                    address: "0.0.0.0".to_string(),
                },
                invalid_option_pause_ms: 1500,
            },
        }
    }
}

impl Default for ServerBinding {
    fn default() -> Self {
        LauncherSettings::default().server
    }
}

impl LauncherSettings {
    /// Loads the settings file if one exists, otherwise the built-in
    /// defaults, then applies environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path();

        let settings = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            tracing::debug!(path = %config_path.display(), "no settings file, using defaults");
            Self::default()
        };

        Ok(settings.with_env_overrides(|key| env::var(key).ok()))
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        let settings: LauncherSettings =
            toml::from_str(&content).map_err(|source| Error::TomlDe {
                path: path.to_path_buf(),
                source,
            })?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.python.trim().is_empty() {
            return Err(Error::Settings("'python' must not be empty".to_string()));
        }
        if self.streamlit.trim().is_empty() {
            return Err(Error::Settings("'streamlit' must not be empty".to_string()));
        }
        if self.server.address.trim().is_empty() {
            return Err(Error::Settings(
                "'server.address' must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(python) = lookup(PYTHON_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            tracing::debug!(%python, "interpreter overridden from environment");
            self.python = python;
        }
        self
    }

    pub fn get_config_path() -> PathBuf {
        let (templates, file_name) = match EmbeddedDefaults::load() {
            Some(defaults) => (defaults.app_config_path, defaults.config_file_name),
            None => (vec!["./".to_string()], "launcher.toml".to_string()),
        };

        Self::resolve_config_file(&templates, &file_name, PACKAGE_NAME, |key| {
            env::var(key).ok().filter(|v| !v.is_empty())
        })
    }

    /// Picks the first candidate directory that already holds the settings
    /// file, or else the first candidate whose variables all expanded.
    fn resolve_config_file<F>(
        templates: &[String],
        file_name: &str,
        package_name: &str,
        lookup: F,
    ) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        let candidates: Vec<PathBuf> = templates
            .iter()
            .map(|template| Self::expand_env_vars(template, package_name, &lookup))
            .filter(|expanded| !expanded.contains('$'))
            .map(|expanded| PathBuf::from(expanded).join(file_name))
            .collect();

        candidates
            .iter()
            .find(|candidate| candidate.is_file())
            .or_else(|| candidates.first())
            .cloned()
            .unwrap_or_else(|| PathBuf::from(file_name))
    }

    fn expand_env_vars<F>(template: &str, package_name: &str, lookup: &F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut result = template.replace("<[package.name]>", package_name);

        for var in ["XDG_CONFIG_HOME", "HOME"] {
            let placeholder = format!("${}", var);
            if result.contains(&placeholder) {
                if let Some(value) = lookup(var) {
                    result = result.replace(&placeholder, &value);
                }
            }
        }

        // Unset variables stay unexpanded so the caller can skip the entry
        result
    }
}
