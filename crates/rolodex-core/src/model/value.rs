// ── Field values ──
//
// The dynamically-typed value a wrapper field is read and written as.
// Records convert to and from their concrete field types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::RecordId;
use crate::error::CoreError;

/// Value of one editable field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Empty,
    Ref(RecordId),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Empty, or text that is only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Ref(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    // ── Conversions used by records ──────────────────────────────────

    /// Text for a required text column. `Empty` becomes `""`.
    pub(crate) fn into_string(self, field: &str) -> Result<String, CoreError> {
        match self {
            Self::Empty => Ok(String::new()),
            Self::Text(s) => Ok(s),
            Self::Ref(id) => Err(CoreError::InvalidValue {
                field: field.to_owned(),
                reason: format!("expected text, got reference {id}"),
            }),
        }
    }

    /// Text for a nullable column. Empty text is stored as `None`.
    pub(crate) fn into_optional_string(self, field: &str) -> Result<Option<String>, CoreError> {
        let s = self.into_string(field)?;
        Ok((!s.is_empty()).then_some(s))
    }

    /// Reference for a nullable foreign-key column.
    pub(crate) fn into_reference(self, field: &str) -> Result<Option<RecordId>, CoreError> {
        match self {
            Self::Empty => Ok(None),
            Self::Ref(id) => Ok(id.persisted()),
            Self::Text(s) if s.trim().is_empty() => Ok(None),
            Self::Text(s) => s
                .parse::<RecordId>()
                .map(RecordId::persisted)
                .map_err(|e| CoreError::InvalidValue {
                    field: field.to_owned(),
                    reason: format!("'{s}' is not a record id ({e})"),
                }),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Ref(id) => write!(f, "{id}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Option<String>> for FieldValue {
    fn from(s: Option<String>) -> Self {
        s.map_or(Self::Empty, Self::Text)
    }
}

impl From<RecordId> for FieldValue {
    fn from(id: RecordId) -> Self {
        Self::Ref(id)
    }
}

impl From<Option<RecordId>> for FieldValue {
    fn from(id: Option<RecordId>) -> Self {
        id.map_or(Self::Empty, Self::Ref)
    }
}
