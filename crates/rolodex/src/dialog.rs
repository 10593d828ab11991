//! Terminal confirmation prompts.

use std::sync::Arc;

use rolodex_core::{ConfirmationDialog, DialogResult, StaticDialog};

/// Asks on the terminal with `dialoguer`. A prompt that cannot be shown
/// (no TTY, closed input) counts as a "no".
#[derive(Debug, Default)]
pub struct TerminalDialog;

impl ConfirmationDialog for TerminalDialog {
    fn ask(&self, message: &str, title: &str) -> DialogResult {
        let answer = dialoguer::Confirm::new()
            .with_prompt(format!("{title}: {message}"))
            .default(false)
            .interact();
        match answer {
            Ok(true) => DialogResult::Confirmed,
            Ok(false) => DialogResult::Cancelled,
            Err(e) => {
                tracing::warn!(error = %e, "confirmation prompt unavailable, answering no");
                DialogResult::Cancelled
            }
        }
    }
}

/// `--yes` or `defaults.confirm = false` answer every question with yes.
pub fn for_options(yes: bool, confirm: bool) -> Arc<dyn ConfirmationDialog> {
    if yes || !confirm {
        Arc::new(StaticDialog::confirming())
    } else {
        Arc::new(TerminalDialog)
    }
}
