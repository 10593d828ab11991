// ── Core identity types ──
//
// RecordId and EntityKind address every record the workspaces edit.
// A zero id marks a record that has not been persisted yet.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};

// ── RecordId ────────────────────────────────────────────────────────

/// Store-assigned identifier of a persisted record.
///
/// `RecordId::NEW` (zero) stands for "created in memory, never saved".
/// The store hands out real ids on the first successful save.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    pub const NEW: Self = Self(0);

    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    pub const fn is_new(self) -> bool {
        self.0 == 0
    }

    /// `None` for unsaved records, the id otherwise.
    pub fn persisted(self) -> Option<Self> {
        (!self.is_new()).then_some(self)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<i64> for RecordId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

// ── EntityKind ──────────────────────────────────────────────────────

/// Closed set of entity kinds a detail workspace can be opened for.
///
/// Tags are kebab-case (`friend`, `programming-language`) and parse
/// case-insensitively.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum EntityKind {
    Friend,
    ProgrammingLanguage,
}

impl EntityKind {
    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Friend => "Friend",
            Self::ProgrammingLanguage => "Programming language",
        }
    }

    pub fn tag(self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
