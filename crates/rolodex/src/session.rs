//! One editing session: database, bus, coordinator and navigation lists.
//!
//! Commands never touch a workspace directly when opening one. They ask
//! the navigation list (or publish on the bus) and let the coordinator
//! pick the request up, the same path the interactive shell takes.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use rolodex_core::{
    ConfirmationDialog, Database, DeleteOutcome, DetailWorkspace, EditTarget, EntityKind,
    EventBus, FieldValue, NavigationItem, NavigationList, NavigationOutcome, NavigationRequest,
    RecordId, WorkspaceConfig, WorkspaceCoordinator, WorkspaceRegistry, WorkspaceServices,
};

use crate::error::CliError;
use crate::output;

pub struct Session {
    bus: Arc<EventBus>,
    dialog: Arc<dyn ConfirmationDialog>,
    dialog_title: String,
    coordinator: WorkspaceCoordinator,
    friends: NavigationList,
    languages: NavigationList,
}

impl Session {
    /// Open the dataset at `data_file` and wire the editing core to it.
    pub async fn start(
        data_file: PathBuf,
        dialog: Arc<dyn ConfirmationDialog>,
        config: WorkspaceConfig,
    ) -> Result<Self, CliError> {
        debug!(path = %data_file.display(), "opening dataset");
        let db = Arc::new(Database::open(data_file).await?);
        let bus = EventBus::new();
        let services = WorkspaceServices::new(db, Arc::clone(&bus), dialog, config);

        let coordinator = WorkspaceCoordinator::new(
            &bus,
            WorkspaceRegistry::standard(&services),
            Arc::clone(&services.dialog),
            services.config.clone(),
        )?;
        let friends = NavigationList::new(
            EntityKind::Friend,
            Arc::clone(&services.lookup),
            Arc::clone(&bus),
        );
        let languages = NavigationList::new(
            EntityKind::ProgrammingLanguage,
            Arc::clone(&services.lookup),
            Arc::clone(&bus),
        );
        friends.load().await?;
        languages.load().await?;

        Ok(Self {
            bus,
            dialog: services.dialog,
            dialog_title: services.config.dialog_title,
            coordinator,
            friends,
            languages,
        })
    }

    /// Ask the session's confirmation dialog.
    pub fn confirm(&self, message: &str) -> bool {
        self.dialog.ask(message, &self.dialog_title).is_confirmed()
    }

    pub fn list(&self, kind: EntityKind) -> Vec<NavigationItem> {
        match kind {
            EntityKind::Friend => self.friends.items(),
            EntityKind::ProgrammingLanguage => self.languages.items(),
        }
    }

    /// Request a workspace for `kind` and let the coordinator handle it.
    /// Languages are edited as one list, so `id` is ignored for them.
    pub async fn open(
        &mut self,
        kind: EntityKind,
        id: Option<RecordId>,
    ) -> Result<NavigationOutcome, CliError> {
        match kind {
            EntityKind::Friend => self.friends.open(id),
            EntityKind::ProgrammingLanguage => {
                self.bus.publish(NavigationRequest::new_record(kind));
            }
        }
        let outcomes = self.coordinator.process_pending().await?;
        answered(kind, &outcomes)
    }

    /// Open, failing unless the workspace actually became active.
    pub async fn open_required(
        &mut self,
        kind: EntityKind,
        id: Option<RecordId>,
    ) -> Result<&mut (dyn DetailWorkspace + 'static), CliError> {
        match self.open(kind, id).await? {
            NavigationOutcome::Opened => self.active_mut(),
            outcome => Err(CliError::usage(format!(
                "could not open {kind}: navigation {outcome:?}"
            ))),
        }
    }

    pub fn active(&self) -> Result<&dyn DetailWorkspace, CliError> {
        self.coordinator.active().ok_or(CliError::NoWorkspace)
    }

    pub fn active_mut(&mut self) -> Result<&mut (dyn DetailWorkspace + 'static), CliError> {
        self.coordinator.active_mut().ok_or(CliError::NoWorkspace)
    }

    pub fn apply(&mut self, edits: Vec<(EditTarget, FieldValue)>) -> Result<(), CliError> {
        let workspace = self.active_mut()?;
        for (target, value) in edits {
            workspace.set_field(&target, value)?;
        }
        Ok(())
    }

    /// Save the active workspace. A record with validation errors is
    /// reported instead of saved; one without changes is left alone.
    /// Returns whether anything was written.
    pub async fn save(&mut self) -> Result<bool, CliError> {
        let workspace = self.active()?;
        if workspace.has_errors() {
            let view = workspace.view();
            return Err(CliError::InvalidRecord {
                title: view.title.clone(),
                details: output::error_lines(&view),
            });
        }
        if !workspace.has_changes() {
            return Ok(false);
        }
        self.coordinator.save_active().await?;
        Ok(true)
    }

    pub async fn delete(&mut self) -> Result<DeleteOutcome, CliError> {
        Ok(self.coordinator.delete_active().await?)
    }

    pub fn close(&mut self) -> NavigationOutcome {
        self.coordinator.close()
    }

    /// Find the child of the active workspace that holds record `id`.
    pub fn child_index(&self, kind: EntityKind, id: RecordId) -> Result<usize, CliError> {
        self.active()?
            .view()
            .children
            .iter()
            .find(|child| child.id == id)
            .map(|child| child.index)
            .ok_or_else(|| CliError::not_found(kind, id))
    }
}

/// Outcome of the request just published. No outcome at all means the
/// coordinator never saw it, which is a wiring defect.
fn answered(
    kind: EntityKind,
    outcomes: &[NavigationOutcome],
) -> Result<NavigationOutcome, CliError> {
    outcomes.last().copied().ok_or_else(|| CliError::Wiring {
        message: format!("no workspace coordinator handled the request to open {kind}"),
    })
}
