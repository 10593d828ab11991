// ── Workspace configuration ──
//
// Plain data handed to the core by the front end. The core never reads
// config files itself; `rolodex-config` builds this from its layers.

/// Texts and labels the workspaces and coordinator show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceConfig {
    /// Label of the "no selection" lookup item.
    pub null_lookup_label: String,
    /// Title passed to every confirmation dialog.
    pub dialog_title: String,
    /// Question asked before discarding unsaved changes.
    pub unsaved_changes_message: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            null_lookup_label: " - ".into(),
            dialog_title: "Question".into(),
            unsaved_changes_message: "You have made changes. Navigate away?".into(),
        }
    }
}

impl WorkspaceConfig {
    /// Question asked before deleting the record labelled `label`.
    pub fn delete_message(label: &str) -> String {
        format!("Do you want to delete {label}?")
    }
}
