// ── Programming-language list workspace ──
//
// Edits the whole language table at once. There is no root record;
// every language is a child.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{
    Bound, ChangeFlag, ChildView, CommandAvailability, DeleteOutcome, DetailWorkspace,
    EditTarget, WorkspaceState, WorkspaceView, child_at, ensure_loadable, ensure_state,
    field_views,
};
use crate::bus::{AfterDeleted, AfterSaved, EventBus};
use crate::error::CoreError;
use crate::model::{EntityKind, FieldValue, ProgrammingLanguage, RecordId, Shared, shared};
use crate::repository::Repository;
use crate::wrapper::{EntityWrapper, parse_field};

const TITLE: &str = "Programming Languages";

pub struct LanguagesWorkspace {
    repo: Arc<dyn Repository<ProgrammingLanguage>>,
    bus: Arc<EventBus>,

    state: WorkspaceState,
    changes: ChangeFlag,
    languages: Vec<Bound<ProgrammingLanguage>>,
    selected: Option<usize>,
    /// Removed since the last save, so the deletion can be announced.
    removed: Vec<Shared<ProgrammingLanguage>>,
}

impl LanguagesWorkspace {
    pub fn new(repo: Arc<dyn Repository<ProgrammingLanguage>>, bus: Arc<EventBus>) -> Self {
        Self {
            repo,
            bus,
            state: WorkspaceState::Uninitialized,
            changes: ChangeFlag::default(),
            languages: Vec::new(),
            selected: None,
            removed: Vec::new(),
        }
    }

    pub fn languages(&self) -> impl Iterator<Item = &EntityWrapper<ProgrammingLanguage>> {
        self.languages.iter().map(|b| &b.wrapper)
    }

    fn bind(&self, record: Shared<ProgrammingLanguage>) -> Bound<ProgrammingLanguage> {
        Bound::new(record, self.changes.listener(Arc::clone(&self.repo)))
    }

    /// Drop all wrappers and every unsaved edit, addition and removal.
    fn discard(&mut self) {
        for bound in self.languages.drain(..) {
            bound.release();
        }
        self.removed.clear();
        self.selected = None;
        self.repo.reject_changes();
    }

    fn mark_dirty(&self) {
        if !self.changes.get() {
            self.changes.set(self.repo.has_pending_changes());
        }
    }
}

#[async_trait]
impl DetailWorkspace for LanguagesWorkspace {
    fn kind(&self) -> EntityKind {
        EntityKind::ProgrammingLanguage
    }

    fn id(&self) -> Option<RecordId> {
        None
    }

    fn title(&self) -> String {
        TITLE.to_owned()
    }

    fn state(&self) -> WorkspaceState {
        self.state
    }

    fn has_changes(&self) -> bool {
        self.changes.get()
    }

    fn has_errors(&self) -> bool {
        self.languages.iter().any(|b| b.wrapper.has_errors())
    }

    fn commands(&self) -> CommandAvailability {
        let ready = self.state == WorkspaceState::Ready;
        CommandAvailability {
            save: ready && self.has_changes() && !self.has_errors(),
            delete: false,
            add_child: ready,
            remove_child: ready && self.selected.is_some(),
        }
    }

    fn view(&self) -> WorkspaceView {
        WorkspaceView {
            kind: self.kind(),
            id: None,
            title: self.title(),
            state: self.state,
            has_changes: self.has_changes(),
            has_errors: self.has_errors(),
            commands: self.commands(),
            fields: Vec::new(),
            children: self
                .languages
                .iter()
                .enumerate()
                .map(|(index, b)| ChildView {
                    index,
                    id: b.record().read().id,
                    fields: field_views(&b.wrapper),
                })
                .collect(),
            selected_child: self.selected,
            lookup: Vec::new(),
        }
    }

    fn set_field(&mut self, target: &EditTarget, value: FieldValue) -> Result<(), CoreError> {
        ensure_state(self.state, "edit")?;
        let Some(index) = target.child else {
            return Err(CoreError::UnknownField {
                kind: EntityKind::ProgrammingLanguage,
                field: target.field.clone(),
            });
        };
        let field = parse_field::<ProgrammingLanguage>(&target.field)?;
        child_at(&mut self.languages, index)?.wrapper.set(field, value)
    }

    fn add_child(&mut self) -> Result<usize, CoreError> {
        if !self.commands().add_child {
            return Err(CoreError::CommandUnavailable { command: "add" });
        }
        let record = shared(ProgrammingLanguage::default());
        self.repo.add(&record);
        let mut bound = self.bind(record);
        bound.wrapper.validate_all();
        self.languages.push(bound);
        self.mark_dirty();
        Ok(self.languages.len() - 1)
    }

    fn select_child(&mut self, index: Option<usize>) -> Result<(), CoreError> {
        if let Some(index) = index {
            child_at(&mut self.languages, index)?;
        }
        self.selected = index;
        Ok(())
    }

    fn remove_child(&mut self) -> Result<(), CoreError> {
        let index = match self.selected {
            Some(index) if self.commands().remove_child => index,
            _ => return Err(CoreError::CommandUnavailable { command: "remove" }),
        };
        child_at(&mut self.languages, index)?;
        let removed = self.languages.remove(index);
        let record = Arc::clone(removed.record());
        self.repo.remove(&record);
        if !record.read().id.is_new() {
            self.removed.push(record);
        }
        removed.release();
        self.selected = None;
        self.mark_dirty();
        Ok(())
    }

    async fn load(&mut self, _id: Option<RecordId>) -> Result<(), CoreError> {
        ensure_loadable(self.state)?;
        debug!("loading programming languages");
        self.discard();
        self.changes.set(false);
        self.state = WorkspaceState::Loading;

        let records = match self.repo.get_all().await {
            Ok(records) => records,
            Err(e) => {
                self.state = WorkspaceState::Uninitialized;
                warn!(error = %e, "programming language load failed");
                return Err(e);
            }
        };
        self.languages = records.into_iter().map(|r| self.bind(r)).collect();
        self.state = WorkspaceState::Ready;
        Ok(())
    }

    async fn save(&mut self) -> Result<(), CoreError> {
        if !self.commands().save {
            return Err(CoreError::CommandUnavailable { command: "save" });
        }
        self.state = WorkspaceState::Saving;
        let result = self.repo.save().await;
        self.state = WorkspaceState::Ready;
        if let Err(e) = result {
            warn!(error = %e, "programming language save failed");
            return Err(e);
        }

        self.changes.set(self.repo.has_pending_changes());
        let removed: Vec<RecordId> = self.removed.iter().map(|r| r.read().id).collect();
        self.removed.clear();
        let saved: Vec<AfterSaved> = self
            .languages
            .iter()
            .map(|b| {
                let record = b.record().read();
                AfterSaved {
                    kind: EntityKind::ProgrammingLanguage,
                    id: record.id,
                    display_label: record.name.clone(),
                }
            })
            .collect();
        info!(saved = saved.len(), removed = removed.len(), "programming languages saved");

        for event in saved {
            self.bus.publish(event);
        }
        for id in removed {
            self.bus.publish(AfterDeleted {
                kind: EntityKind::ProgrammingLanguage,
                id,
            });
        }
        Ok(())
    }

    async fn delete(&mut self) -> Result<DeleteOutcome, CoreError> {
        Err(CoreError::Unsupported {
            operation: "delete",
            kind: EntityKind::ProgrammingLanguage,
        })
    }
}
