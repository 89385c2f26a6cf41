//! Configuration file loading and environment variable handling.
//!
//! Precedence: CLI args > per-user settings > Environment vars > Config file > Defaults

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides the directory holding `config.toml` and `users.toml`.
pub const CONFIG_DIR_ENV: &str = "RELATIME_CONFIG_DIR";

/// Default config file content for `relatime config init`.
pub const DEFAULT_CONFIG: &str = r#"# relatime configuration
# See: relatime --help for all options

# Timezone used when none is given (IANA name or offset such as +05:30)
timezone = "UTC"

# Which expressions to look for: absolute, relative or both
mode = "both"

# Reply style: discord (<t:EPOCH:F> markup) or plain
style = "discord"

# Append the raw markup to every reply line
code = false
"#;

/// Configuration loaded from file and environment.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timezone: Option<String>,
    pub mode: Option<String>,
    pub style: Option<String>,
    pub code: Option<bool>,
}

impl Config {
    /// Directory holding the config file and the per-user settings.
    ///
    /// - `$RELATIME_CONFIG_DIR` when set
    /// - Linux/macOS: `~/.config/relatime`
    /// - Windows: `%APPDATA%\relatime`
    pub fn dir() -> Option<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Some(PathBuf::from(dir));
        }
        dirs::config_dir().map(|p| p.join("relatime"))
    }

    /// Get the config file path.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|dir| dir.join("config.toml"))
    }

    /// Load config from file. Returns default if file doesn't exist.
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(contents) = fs::read_to_string(path) else {
            return Self::default();
        };

        toml::from_str(&contents).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Read value from environment variable.
    fn env_var<T: std::str::FromStr>(name: &str) -> Option<T> {
        std::env::var(name).ok()?.parse().ok()
    }

    /// Get timezone with precedence: env > config > default.
    pub fn timezone(&self) -> String {
        Self::env_var("RELATIME_TZ")
            .or_else(|| self.timezone.clone())
            .unwrap_or_else(|| "UTC".to_string())
    }

    /// Get mode with precedence: env > config > default.
    pub fn mode(&self) -> String {
        Self::env_var("RELATIME_MODE")
            .or_else(|| self.mode.clone())
            .unwrap_or_else(|| "both".to_string())
    }

    /// Get style with precedence: env > config > default.
    pub fn style(&self) -> String {
        Self::env_var("RELATIME_STYLE")
            .or_else(|| self.style.clone())
            .unwrap_or_else(|| "discord".to_string())
    }

    pub fn code(&self) -> bool {
        Self::env_var("RELATIME_CODE")
            .or(self.code)
            .unwrap_or(false)
    }

    /// Where a setting's value came from, for debug logging.
    pub fn source(&self, env: &str, in_file: bool) -> String {
        if std::env::var(env).is_ok() {
            format!("env {env}")
        } else if in_file {
            "config file".to_string()
        } else {
            "default".to_string()
        }
    }
}

/// Create a default config file at the standard location.
pub fn init_config() -> Result<PathBuf, String> {
    let path = Config::path().ok_or("Cannot determine config directory")?;

    if path.exists() {
        return Err(format!("Config file already exists: {}", path.display()));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("Failed to create directory: {}", e))?;
    }

    fs::write(&path, DEFAULT_CONFIG).map_err(|e| format!("Failed to write config: {}", e))?;

    Ok(path)
}
