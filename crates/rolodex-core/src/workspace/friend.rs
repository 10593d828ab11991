// ── Friend detail workspace ──

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{
    Bound, ChangeFlag, ChildView, CommandAvailability, DeleteOutcome, DetailWorkspace,
    EditTarget, WorkspaceState, WorkspaceView, child_at, ensure_loadable, ensure_state,
    field_views,
};
use crate::bus::{AfterDeleted, AfterSaved, EventBus};
use crate::config::WorkspaceConfig;
use crate::dialog::{ConfirmationDialog, DialogResult};
use crate::error::CoreError;
use crate::model::{
    Entity, EntityKind, FieldValue, Friend, LookupItem, PhoneNumber, RecordId, Shared, shared,
};
use crate::repository::{LookupService, Repository};
use crate::wrapper::{EntityWrapper, parse_field};

/// Editor for one friend and its phone numbers.
pub struct FriendWorkspace {
    repo: Arc<dyn Repository<Friend>>,
    lookup: Arc<dyn LookupService>,
    bus: Arc<EventBus>,
    dialog: Arc<dyn ConfirmationDialog>,
    config: WorkspaceConfig,

    state: WorkspaceState,
    changes: ChangeFlag,
    friend: Option<Bound<Friend>>,
    phone_numbers: Vec<Bound<PhoneNumber>>,
    selected: Option<usize>,
    languages: Vec<LookupItem>,
}

impl FriendWorkspace {
    pub fn new(
        repo: Arc<dyn Repository<Friend>>,
        lookup: Arc<dyn LookupService>,
        bus: Arc<EventBus>,
        dialog: Arc<dyn ConfirmationDialog>,
        config: WorkspaceConfig,
    ) -> Self {
        Self {
            repo,
            lookup,
            bus,
            dialog,
            config,
            state: WorkspaceState::Uninitialized,
            changes: ChangeFlag::default(),
            friend: None,
            phone_numbers: Vec::new(),
            selected: None,
            languages: Vec::new(),
        }
    }

    pub fn friend(&self) -> Option<&EntityWrapper<Friend>> {
        self.friend.as_ref().map(|b| &b.wrapper)
    }

    pub fn phone_numbers(&self) -> impl Iterator<Item = &EntityWrapper<PhoneNumber>> {
        self.phone_numbers.iter().map(|b| &b.wrapper)
    }

    /// Programming-language choices, headed by the null item.
    pub fn languages(&self) -> &[LookupItem] {
        &self.languages
    }

    fn display_label(&self) -> String {
        self.friend
            .as_ref()
            .map(|b| b.record().read().display_label())
            .unwrap_or_default()
    }

    fn record_id(&self) -> RecordId {
        self.friend
            .as_ref()
            .map_or(RecordId::NEW, |b| b.record().read().id)
    }

    fn bind_phone_number(&self, record: Shared<PhoneNumber>) -> Bound<PhoneNumber> {
        Bound::new(record, self.changes.listener(Arc::clone(&self.repo)))
    }

    /// Drop all wrappers, detaching the workspace listeners first.
    fn unbind(&mut self) {
        if let Some(friend) = self.friend.take() {
            friend.release();
        }
        for phone in self.phone_numbers.drain(..) {
            phone.release();
        }
        self.selected = None;
    }

    async fn fetch(
        &self,
        id: Option<RecordId>,
    ) -> Result<(Shared<Friend>, Vec<LookupItem>), CoreError> {
        let existing = match id.and_then(RecordId::persisted) {
            Some(id) => Some(self.repo.get_by_id(id).await?),
            None => None,
        };

        let mut languages = vec![LookupItem::none(self.config.null_lookup_label.as_str())];
        languages.extend(self.lookup.lookup_items(EntityKind::ProgrammingLanguage).await?);

        let record = match existing {
            Some(record) => record,
            None => {
                let record = shared(Friend::default());
                self.repo.add(&record);
                record
            }
        };
        Ok((record, languages))
    }

    fn mark_dirty(&self) {
        if !self.changes.get() {
            self.changes.set(self.repo.has_pending_changes());
        }
    }
}

#[async_trait]
impl DetailWorkspace for FriendWorkspace {
    fn kind(&self) -> EntityKind {
        EntityKind::Friend
    }

    fn id(&self) -> Option<RecordId> {
        self.record_id().persisted()
    }

    fn title(&self) -> String {
        match self.friend {
            Some(_) if self.record_id().is_new() => "New friend".to_owned(),
            Some(_) => self.display_label(),
            None => "Friend".to_owned(),
        }
    }

    fn state(&self) -> WorkspaceState {
        self.state
    }

    fn has_changes(&self) -> bool {
        self.changes.get()
    }

    fn has_errors(&self) -> bool {
        self.friend.as_ref().is_some_and(|b| b.wrapper.has_errors())
            || self.phone_numbers.iter().any(|b| b.wrapper.has_errors())
    }

    fn commands(&self) -> CommandAvailability {
        let ready = self.state == WorkspaceState::Ready && self.friend.is_some();
        CommandAvailability {
            save: ready && self.has_changes() && !self.has_errors(),
            delete: ready,
            add_child: ready,
            remove_child: ready && self.selected.is_some(),
        }
    }

    fn view(&self) -> WorkspaceView {
        WorkspaceView {
            kind: self.kind(),
            id: self.id(),
            title: self.title(),
            state: self.state,
            has_changes: self.has_changes(),
            has_errors: self.has_errors(),
            commands: self.commands(),
            fields: self.friend.as_ref().map(|b| field_views(&b.wrapper)).unwrap_or_default(),
            children: self
                .phone_numbers
                .iter()
                .enumerate()
                .map(|(index, b)| ChildView {
                    index,
                    id: b.record().read().id,
                    fields: field_views(&b.wrapper),
                })
                .collect(),
            selected_child: self.selected,
            lookup: self.languages.clone(),
        }
    }

    fn set_field(&mut self, target: &EditTarget, value: FieldValue) -> Result<(), CoreError> {
        ensure_state(self.state, "edit")?;
        match target.child {
            Some(index) => {
                let field = parse_field::<PhoneNumber>(&target.field)?;
                child_at(&mut self.phone_numbers, index)?.wrapper.set(field, value)
            }
            None => {
                let field = parse_field::<Friend>(&target.field)?;
                let friend = self.friend.as_mut().ok_or_else(|| CoreError::InvalidState {
                    operation: "edit",
                    state: "empty".into(),
                })?;
                friend.wrapper.set(field, value)
            }
        }
    }

    fn add_child(&mut self) -> Result<usize, CoreError> {
        if !self.commands().add_child {
            return Err(CoreError::CommandUnavailable { command: "add" });
        }
        let record = shared(PhoneNumber::default());
        if let Some(friend) = &self.friend {
            friend.record().write().phone_numbers.push(Arc::clone(&record));
        }
        let mut bound = self.bind_phone_number(record);
        bound.wrapper.validate_all();
        self.phone_numbers.push(bound);
        self.mark_dirty();
        debug!(count = self.phone_numbers.len(), "phone number added");
        Ok(self.phone_numbers.len() - 1)
    }

    fn select_child(&mut self, index: Option<usize>) -> Result<(), CoreError> {
        if let Some(index) = index {
            child_at(&mut self.phone_numbers, index)?;
        }
        self.selected = index;
        Ok(())
    }

    fn remove_child(&mut self) -> Result<(), CoreError> {
        let index = match self.selected {
            Some(index) if self.commands().remove_child => index,
            _ => return Err(CoreError::CommandUnavailable { command: "remove" }),
        };
        child_at(&mut self.phone_numbers, index)?;
        let removed = self.phone_numbers.remove(index);
        if let Some(friend) = &self.friend {
            friend
                .record()
                .write()
                .phone_numbers
                .retain(|p| !Arc::ptr_eq(p, removed.record()));
        }
        removed.release();
        self.selected = None;
        self.mark_dirty();
        debug!(index, "phone number removed");
        Ok(())
    }

    async fn load(&mut self, id: Option<RecordId>) -> Result<(), CoreError> {
        ensure_loadable(self.state)?;
        debug!(?id, "loading friend");
        self.unbind();
        // Each load starts from the stored record.
        self.repo.reject_changes();
        self.languages.clear();
        self.changes.set(false);
        self.state = WorkspaceState::Loading;

        let (record, languages) = match self.fetch(id).await {
            Ok(loaded) => loaded,
            Err(e) => {
                self.state = WorkspaceState::Uninitialized;
                warn!(?id, error = %e, "friend load failed");
                return Err(e);
            }
        };

        let is_new = record.read().id.is_new();
        let children: Vec<Shared<PhoneNumber>> = record.read().phone_numbers.clone();
        let mut friend = Bound::new(record, self.changes.listener(Arc::clone(&self.repo)));
        self.phone_numbers = children
            .into_iter()
            .map(|phone| self.bind_phone_number(phone))
            .collect();
        if is_new {
            friend.wrapper.validate_all();
            self.mark_dirty();
        }
        self.friend = Some(friend);
        self.languages = languages;
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
            warn!(error = %e, "friend save failed");
            return Err(e);
        }

        self.changes.set(self.repo.has_pending_changes());
        let event = AfterSaved {
            kind: EntityKind::Friend,
            id: self.record_id(),
            display_label: self.display_label(),
        };
        info!(id = %event.id, label = %event.display_label, "friend saved");
        self.bus.publish(event);
        Ok(())
    }

    async fn delete(&mut self) -> Result<DeleteOutcome, CoreError> {
        let record = match &self.friend {
            Some(friend) if self.commands().delete => Arc::clone(friend.record()),
            _ => return Err(CoreError::CommandUnavailable { command: "delete" }),
        };
        let message = WorkspaceConfig::delete_message(&self.display_label());
        if self.dialog.ask(&message, &self.config.dialog_title) == DialogResult::Cancelled {
            debug!("friend delete cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        let id = self.record_id();
        self.state = WorkspaceState::Deleting;
        self.repo.remove(&record);
        if let Err(e) = self.repo.save().await {
            self.repo.add(&record);
            self.state = WorkspaceState::Ready;
            warn!(%id, error = %e, "friend delete failed");
            return Err(e);
        }

        self.unbind();
        self.changes.set(false);
        self.state = WorkspaceState::Terminated;
        info!(%id, "friend deleted");
        self.bus.publish(AfterDeleted {
            kind: EntityKind::Friend,
            id,
        });
        Ok(DeleteOutcome::Deleted)
    }
}
