use std::sync::atomic::{AtomicUsize, Ordering};

/// Answer to a yes/no question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogResult {
    Confirmed,
    Cancelled,
}

impl DialogResult {
    pub fn is_confirmed(self) -> bool {
        self == Self::Confirmed
    }
}

/// Asks the user to confirm a destructive or lossy action.
///
/// Implementations block until answered; front ends supply a terminal
/// prompt, tests and non-interactive runs a fixed answer.
pub trait ConfirmationDialog: Send + Sync {
    fn ask(&self, message: &str, title: &str) -> DialogResult;
}

/// Always gives the same answer and counts how often it was asked.
#[derive(Debug)]
pub struct StaticDialog {
    answer: DialogResult,
    asked: AtomicUsize,
}

impl StaticDialog {
    pub fn new(answer: DialogResult) -> Self {
        Self {
            answer,
            asked: AtomicUsize::new(0),
        }
    }

    pub fn confirming() -> Self {
        Self::new(DialogResult::Confirmed)
    }

    pub fn cancelling() -> Self {
        Self::new(DialogResult::Cancelled)
    }

    pub fn times_asked(&self) -> usize {
        self.asked.load(Ordering::Relaxed)
    }
}

impl ConfirmationDialog for StaticDialog {
    fn ask(&self, message: &str, title: &str) -> DialogResult {
        self.asked.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(title, message, answer = ?self.answer, "confirmation answered");
        self.answer
    }
}
