//! The application's `.env` record, read the same way the application's own
//! settings loader reads it. The launcher never writes this file.

use anyhow::Context;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;

pub const ENVIRONMENT_KEY: &str = "ENVIRONMENT";
pub const ADMIN_PASSWORD_KEY: &str = "ADMIN_PASSWORD";
pub const ADMIN_LOGIN_KEY: &str = "ADMIN_LOGIN";
pub const DEBUG_KEY: &str = "DEBUG";
pub const STREAMLIT_CLOUD_KEY: &str = "STREAMLIT_CLOUD";

pub const PRODUCTION: &str = "production";
pub const DEFAULT_ENVIRONMENT: &str = "development";
/// Password the application falls back to when none is configured.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
pub const DEFAULT_ADMIN_LOGIN: &str = "admin";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvRecord {
    values: BTreeMap<String, String>,
}

impl EnvRecord {
    /// Non-UTF-8 bytes are replaced rather than rejected, so a password
    /// saved in Latin-1 still yields a record.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    pub fn parse(content: &str) -> Self {
        Self {
            values: content.lines().filter_map(Self::parse_line).collect(),
        }
    }

    fn parse_line(line: &str) -> Option<(String, String)> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        let (key, raw_value) = line.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }

        Some((key.to_string(), Self::unquote(raw_value.trim())))
    }

    fn unquote(raw: &str) -> String {
        for quote in ['"', '\''] {
            if let Some(rest) = raw.strip_prefix(quote) {
                if let Some(end) = rest.find(quote) {
                    return rest[..end].to_string();
                }
            }
        }

        // Unquoted values end at an inline " #" comment
        match raw.find(" #") {
            Some(pos) => raw[..pos].trim_end().to_string(),
            None => raw.to_string(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn environment(&self) -> &str {
        self.get(ENVIRONMENT_KEY).unwrap_or(DEFAULT_ENVIRONMENT)
    }

    /// Configured admin password; an absent or empty value resolves to the
    /// application's built-in default.
    pub fn admin_password(&self) -> &str {
        self.get(ADMIN_PASSWORD_KEY)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_ADMIN_PASSWORD)
    }

    pub fn admin_login(&self) -> &str {
        self.get(ADMIN_LOGIN_KEY)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_ADMIN_LOGIN)
    }

    pub fn debug(&self) -> bool {
        self.flag(DEBUG_KEY)
    }

    pub fn is_streamlit_cloud(&self) -> bool {
        self.flag(STREAMLIT_CLOUD_KEY)
    }

    pub fn is_production(&self) -> bool {
        self.environment() == PRODUCTION
    }

    pub fn uses_default_password(&self) -> bool {
        self.admin_password() == DEFAULT_ADMIN_PASSWORD
    }

    fn flag(&self, key: &str) -> bool {
        self.get(key)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }
}
