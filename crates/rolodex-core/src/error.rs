// ── Core error types ──
//
// Errors surfaced by workspaces, the coordinator and the persistence
// session. Field validation problems are NOT errors: they live in the
// wrapper error sets and only ever disable commands.

use thiserror::Error;

use crate::model::{EntityKind, RecordId};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Data errors ──────────────────────────────────────────────────
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: RecordId },

    #[error("Unknown field '{field}' on {kind}")]
    UnknownField { kind: EntityKind, field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("No child at index {index} (collection has {len})")]
    ChildOutOfRange { index: usize, len: usize },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Command '{command}' is not available right now")]
    CommandUnavailable { command: &'static str },

    #[error("Cannot {operation} while the workspace is {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    #[error("Operation not supported: {operation} on {kind}")]
    Unsupported {
        operation: &'static str,
        kind: EntityKind,
    },

    // ── Persistence errors ───────────────────────────────────────────
    #[error("Persistence failed: {message}")]
    Persistence {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl CoreError {
    pub(crate) fn persistence(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Persistence {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether the caller can reasonably retry the same operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}
