use serde::{Deserialize, Serialize};

use super::RecordId;

/// `{id, label}` pair used by selection fields and navigation lists.
///
/// `id == None` is the "no selection" item that heads a nullable lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupItem {
    pub id: Option<RecordId>,
    pub display_label: String,
}

impl LookupItem {
    pub fn new(id: RecordId, display_label: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            display_label: display_label.into(),
        }
    }

    /// The null item, e.g. `" - "`.
    pub fn none(display_label: impl Into<String>) -> Self {
        Self {
            id: None,
            display_label: display_label.into(),
        }
    }
}
