//! Configuration for rolodex.
//!
//! Settings are layered with figment: built-in defaults, then the TOML
//! file (platform config path or an explicit override), then `ROLODEX_`
//! environment variables. Nested keys use a double underscore, e.g.
//! `ROLODEX_DEFAULTS__OUTPUT=json` or `ROLODEX_DATA_FILE=/tmp/r.json`.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use rolodex_core::WorkspaceConfig;

/// Output formats the front end knows how to render.
pub const OUTPUT_FORMATS: [&str; 5] = ["table", "json", "json-compact", "yaml", "plain"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Validation error in {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Figment error: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Figment(Box::new(e))
    }
}

// ── Config types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dataset file. Falls back to the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
    pub defaults: Defaults,
    pub editor: Editor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub output: String,
    /// Ask before destructive or discarding actions.
    pub confirm: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            confirm: true,
        }
    }
}

/// User-facing texts of the editing workspaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Editor {
    pub null_lookup_label: String,
    pub dialog_title: String,
    pub unsaved_changes_message: String,
}

impl Default for Editor {
    fn default() -> Self {
        let core = WorkspaceConfig::default();
        Self {
            null_lookup_label: core.null_lookup_label,
            dialog_title: core.dialog_title,
            unsaved_changes_message: core.unsaved_changes_message,
        }
    }
}

fn default_output() -> String {
    "table".into()
}

impl Config {
    /// Reject values the front end cannot act on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !OUTPUT_FORMATS.contains(&self.defaults.output.as_str()) {
            return Err(ConfigError::Validation {
                field: "defaults.output".into(),
                reason: format!(
                    "unknown format '{}', expected one of: {}",
                    self.defaults.output,
                    OUTPUT_FORMATS.join(", ")
                ),
            });
        }
        for (field, text) in [
            ("editor.dialog_title", &self.editor.dialog_title),
            ("editor.unsaved_changes_message", &self.editor.unsaved_changes_message),
        ] {
            if text.trim().is_empty() {
                return Err(ConfigError::Validation {
                    field: field.into(),
                    reason: "must not be empty".into(),
                });
            }
        }
        Ok(())
    }

    /// Effective dataset path.
    pub fn data_file_path(&self) -> PathBuf {
        self.data_file.clone().unwrap_or_else(default_data_file)
    }

    pub fn to_workspace_config(&self) -> WorkspaceConfig {
        WorkspaceConfig {
            null_lookup_label: self.editor.null_lookup_label.clone(),
            dialog_title: self.editor.dialog_title.clone(),
            unsaved_changes_message: self.editor.unsaved_changes_message.clone(),
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "rolodex", "rolodex")
}

fn home_fallback(relative: &str) -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    PathBuf::from(home).join(relative)
}

/// Canonical config file path.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config/rolodex/config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Dataset path used when none is configured.
pub fn default_data_file() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".local/share/rolodex/rolodex.json"),
        |dirs| dirs.data_dir().join("rolodex.json"),
    )
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load and validate the layered configuration. `path` replaces the
/// platform config path; a missing file contributes nothing.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("ROLODEX_").split("__"))
        .extract()?;

    config.validate()?;
    Ok(config)
}

/// Render the effective configuration as TOML.
pub fn render_toml(config: &Config) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}
