// ── Workspace coordinator ──
//
// Owns the single active detail workspace. Bus handlers only enqueue;
// `process_pending` drains the queue and does the async work, so no
// load ever runs inside a bus dispatch.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::bus::{AfterDeleted, BusEvent, EventBus, EventKind, NavigationRequest, Subscription};
use crate::config::WorkspaceConfig;
use crate::dialog::ConfirmationDialog;
use crate::error::CoreError;
use crate::workspace::{DeleteOutcome, DetailWorkspace, WorkspaceRegistry, WorkspaceState};

/// Result of a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NavigationOutcome {
    Opened,
    Closed,
    /// The user chose to keep unsaved changes.
    Declined,
}

pub struct WorkspaceCoordinator {
    registry: WorkspaceRegistry,
    dialog: Arc<dyn ConfirmationDialog>,
    config: WorkspaceConfig,
    active: Option<Box<dyn DetailWorkspace>>,
    inbox: mpsc::UnboundedReceiver<BusEvent>,
    _subscriptions: Vec<Subscription>,
}

impl WorkspaceCoordinator {
    /// Wire the coordinator to `bus`. Fails when `registry` does not
    /// cover every entity kind.
    pub fn new(
        bus: &Arc<EventBus>,
        registry: WorkspaceRegistry,
        dialog: Arc<dyn ConfirmationDialog>,
        config: WorkspaceConfig,
    ) -> Result<Self, CoreError> {
        registry.validate()?;

        let (tx, inbox) = mpsc::unbounded_channel();
        let subscriptions = [EventKind::OpenDetail, EventKind::AfterDeleted]
            .into_iter()
            .map(|kind| {
                let tx = tx.clone();
                bus.subscribe(kind, move |event| {
                    // Only fails once the coordinator is gone.
                    let _ = tx.send(event.clone());
                })
            })
            .collect();

        Ok(Self {
            registry,
            dialog,
            config,
            active: None,
            inbox,
            _subscriptions: subscriptions,
        })
    }

    pub fn active(&self) -> Option<&dyn DetailWorkspace> {
        self.active.as_deref()
    }

    pub fn active_mut(&mut self) -> Option<&mut (dyn DetailWorkspace + 'static)> {
        self.active.as_deref_mut()
    }

    /// Handle every queued bus event, in order. Stops at the first
    /// failing navigation; later events stay queued.
    pub async fn process_pending(&mut self) -> Result<Vec<NavigationOutcome>, CoreError> {
        let mut outcomes = Vec::new();
        while let Ok(event) = self.inbox.try_recv() {
            match event {
                BusEvent::OpenDetail(request) => outcomes.push(self.open_detail(request).await?),
                BusEvent::AfterDeleted(deleted) => self.on_deleted(deleted),
                BusEvent::AfterSaved(_) => {}
            }
        }
        Ok(outcomes)
    }

    /// Replace the active workspace with a freshly loaded one.
    ///
    /// When the load fails the previous workspace stays active and the
    /// error is returned.
    pub async fn open_detail(
        &mut self,
        request: NavigationRequest,
    ) -> Result<NavigationOutcome, CoreError> {
        if !self.may_discard() {
            warn!(kind = %request.kind, id = ?request.id, "navigation declined");
            return Ok(NavigationOutcome::Declined);
        }

        let mut workspace = self.registry.create(request.kind)?;
        workspace.load(request.id).await?;
        info!(kind = %request.kind, id = ?request.id, "detail opened");
        self.active = Some(workspace);
        Ok(NavigationOutcome::Opened)
    }

    /// Drop the active workspace, asking first if it has changes.
    pub fn close(&mut self) -> NavigationOutcome {
        if !self.may_discard() {
            return NavigationOutcome::Declined;
        }
        if self.active.take().is_some() {
            debug!("detail closed");
        }
        NavigationOutcome::Closed
    }

    pub async fn save_active(&mut self) -> Result<(), CoreError> {
        self.require_active("save")?.save().await?;
        self.process_pending().await?;
        Ok(())
    }

    pub async fn delete_active(&mut self) -> Result<DeleteOutcome, CoreError> {
        let outcome = self.require_active("delete")?.delete().await?;
        if self
            .active
            .as_ref()
            .is_some_and(|ws| ws.state() == WorkspaceState::Terminated)
        {
            self.active = None;
        }
        self.process_pending().await?;
        Ok(outcome)
    }

    fn require_active(
        &mut self,
        operation: &'static str,
    ) -> Result<&mut Box<dyn DetailWorkspace>, CoreError> {
        self.active.as_mut().ok_or_else(|| CoreError::InvalidState {
            operation,
            state: "empty".into(),
        })
    }

    /// Whether the active workspace may be thrown away.
    fn may_discard(&self) -> bool {
        match &self.active {
            Some(ws) if ws.has_changes() && ws.state() != WorkspaceState::Terminated => self
                .dialog
                .ask(&self.config.unsaved_changes_message, &self.config.dialog_title)
                .is_confirmed(),
            _ => true,
        }
    }

    fn on_deleted(&mut self, deleted: AfterDeleted) {
        let matches = self
            .active
            .as_ref()
            .is_some_and(|ws| ws.kind() == deleted.kind && ws.id() == Some(deleted.id));
        if matches {
            debug!(kind = %deleted.kind, id = %deleted.id, "active record deleted elsewhere");
            self.active = None;
        }
    }
}

impl fmt::Debug for WorkspaceCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkspaceCoordinator")
            .field("registry", &self.registry)
            .field("active", &self.active.as_ref().map(|ws| (ws.kind(), ws.id())))
            .finish_non_exhaustive()
    }
}
