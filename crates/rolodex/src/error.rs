//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

use rolodex_config::ConfigError;
use rolodex_core::{CoreError, EntityKind};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const VALIDATION: i32 = 5;
    pub const PERSISTENCE: i32 = 6;
    pub const CONFIGURATION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(rolodex::not_found),
        help("Run: rolodex {list_command} to see available records")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("{title} has validation errors; nothing was saved")]
    #[diagnostic(code(rolodex::invalid_record), help("{details}"))]
    InvalidRecord { title: String, details: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(rolodex::validation))]
    Validation { field: String, reason: String },

    // ── Usage ────────────────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(code(rolodex::usage))]
    Usage { message: String },

    #[error("No record is open")]
    #[diagnostic(
        code(rolodex::no_workspace),
        help("Open one first, e.g. `open friend 1`, `open friend new` or `open languages`")
    )]
    NoWorkspace,

    // ── Persistence ──────────────────────────────────────────────────

    #[error("Could not store the data file: {message}")]
    #[diagnostic(
        code(rolodex::persistence),
        help("Check that the data file is valid JSON and its directory is writable.")
    )]
    Persistence {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(rolodex::config),
        help("Check the config file (rolodex config path) and ROLODEX_* environment variables.")
    )]
    Config(#[from] ConfigError),

    #[error("Internal wiring error: {message}")]
    #[diagnostic(code(rolodex::wiring))]
    Wiring { message: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render JSON: {0}")]
    #[diagnostic(code(rolodex::json))]
    Json(#[from] serde_json::Error),

    #[error("Could not render YAML: {0}")]
    #[diagnostic(code(rolodex::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::InvalidRecord { .. } | Self::Validation { .. } => exit_code::VALIDATION,
            Self::Usage { .. } | Self::NoWorkspace => exit_code::USAGE,
            Self::Persistence { .. } => exit_code::PERSISTENCE,
            Self::Config(_) | Self::Wiring { .. } => exit_code::CONFIGURATION,
            Self::Io(_) | Self::Json(_) | Self::Yaml(_) => exit_code::GENERAL,
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    pub fn not_found(kind: EntityKind, identifier: impl ToString) -> Self {
        Self::NotFound {
            resource_type: kind.to_string(),
            identifier: identifier.to_string(),
            list_command: list_command(kind).into(),
        }
    }
}

fn list_command(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Friend => "friends list",
        EntityKind::ProgrammingLanguage => "languages list",
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { kind, id } => Self::not_found(kind, id),

            CoreError::InvalidValue { field, reason } => Self::Validation { field, reason },

            err @ (CoreError::UnknownField { .. }
            | CoreError::ChildOutOfRange { .. }
            | CoreError::CommandUnavailable { .. }
            | CoreError::InvalidState { .. }
            | CoreError::Unsupported { .. }) => Self::usage(err.to_string()),

            CoreError::Persistence { message, source } => Self::Persistence { message, source },

            CoreError::Configuration { message } => Self::Wiring { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolodex_core::RecordId;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (
                CoreError::NotFound {
                    kind: EntityKind::Friend,
                    id: RecordId::new(9),
                },
                exit_code::NOT_FOUND,
            ),
            (
                CoreError::InvalidValue {
                    field: "favorite_language_id".into(),
                    reason: "not a record id".into(),
                },
                exit_code::VALIDATION,
            ),
            (
                CoreError::CommandUnavailable { command: "save" },
                exit_code::USAGE,
            ),
            (
                CoreError::Persistence {
                    message: "disk full".into(),
                    source: None,
                },
                exit_code::PERSISTENCE,
            ),
            (
                CoreError::Configuration {
                    message: "no factory".into(),
                },
                exit_code::CONFIGURATION,
            ),
        ];
        for (core, code) in cases {
            let text = core.to_string();
            assert_eq!(CliError::from(core).exit_code(), code, "{text}");
        }
    }

    #[test]
    fn not_found_points_at_list_command() {
        let err = CliError::not_found(EntityKind::ProgrammingLanguage, RecordId::new(4));
        let CliError::NotFound { list_command, .. } = &err else {
            panic!("expected NotFound");
        };
        assert_eq!(list_command, "languages list");
    }
}
