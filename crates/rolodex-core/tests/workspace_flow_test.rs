#![allow(clippy::unwrap_used)]
// Integration tests for the detail workspaces over an in-memory database.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use rolodex_core::model::{FriendRow, Shared};
use rolodex_core::{
    AfterDeleted, AfterSaved, BusEvent, CommandAvailability, ConfirmationDialog, CoreError,
    Database, Dataset, DeleteOutcome, DetailWorkspace, DialogResult, EditTarget, EntityKind,
    EventBus, EventKind, FieldValue, Friend, FriendWorkspace, LookupService, PhoneNumber,
    ProgrammingLanguage, RecordId, Repository, StaticDialog, Subscription, TrackedRepository,
    WorkspaceConfig, WorkspaceRegistry, WorkspaceServices, WorkspaceState,
};

// ── Helpers ─────────────────────────────────────────────────────────

const CSHARP: RecordId = RecordId::new(1);
const ADA: RecordId = RecordId::new(3);
const ADA_PHONE: RecordId = RecordId::new(4);
const GRACE: RecordId = RecordId::new(5);
const NEXT: RecordId = RecordId::new(6);

fn dataset() -> Dataset {
    let mut data = Dataset::default();
    for name in ["C#", "Rust"] {
        data.insert::<ProgrammingLanguage>(ProgrammingLanguage {
            id: RecordId::NEW,
            name: name.into(),
        })
        .unwrap();
    }
    data.insert::<Friend>(FriendRow {
        first_name: "Ada".into(),
        last_name: Some("Lovelace".into()),
        favorite_language_id: Some(CSHARP),
        phone_numbers: vec![PhoneNumber {
            id: RecordId::NEW,
            number: "+44 20 7946 0000".into(),
        }],
        ..FriendRow::default()
    })
    .unwrap();
    data.insert::<Friend>(FriendRow {
        first_name: "Grace".into(),
        last_name: Some("Hopper".into()),
        ..FriendRow::default()
    })
    .unwrap();
    data
}

struct Fixture {
    db: Arc<Database>,
    bus: Arc<EventBus>,
    dialog: Arc<StaticDialog>,
    events: Arc<Mutex<Vec<BusEvent>>>,
    _subs: Vec<Subscription>,
}

impl Fixture {
    fn new(db: Database, answer: DialogResult) -> Self {
        let bus = EventBus::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let subs = [EventKind::AfterSaved, EventKind::AfterDeleted]
            .into_iter()
            .map(|kind| {
                let sink = Arc::clone(&events);
                bus.subscribe(kind, move |e| sink.lock().unwrap().push(e.clone()))
            })
            .collect();
        Self {
            db: Arc::new(db),
            bus,
            dialog: Arc::new(StaticDialog::new(answer)),
            events,
            _subs: subs,
        }
    }

    fn seeded() -> Self {
        Self::new(Database::new(dataset(), None).unwrap(), DialogResult::Confirmed)
    }

    /// Seeded database whose file path is a directory, so every commit fails.
    fn failing(dir: &tempfile::TempDir) -> Self {
        Self::new(
            Database::new(dataset(), Some(dir.path().to_path_buf())).unwrap(),
            DialogResult::Confirmed,
        )
    }

    fn friend_workspace(&self) -> FriendWorkspace {
        FriendWorkspace::new(
            Arc::new(TrackedRepository::<Friend>::new(Arc::clone(&self.db))),
            Arc::clone(&self.db) as Arc<dyn LookupService>,
            Arc::clone(&self.bus),
            Arc::clone(&self.dialog) as Arc<dyn ConfirmationDialog>,
            WorkspaceConfig::default(),
        )
    }

    fn workspace(&self, kind: EntityKind) -> Box<dyn DetailWorkspace> {
        let services = WorkspaceServices::new(
            Arc::clone(&self.db),
            Arc::clone(&self.bus),
            Arc::clone(&self.dialog) as Arc<dyn ConfirmationDialog>,
            WorkspaceConfig::default(),
        );
        WorkspaceRegistry::standard(&services).create(kind).unwrap()
    }

    fn events(&self) -> Vec<BusEvent> {
        self.events.lock().unwrap().clone()
    }
}

/// Session that shares its unit of work with other editors, so it may
/// still have pending changes after its own save.
struct SharedUnitOfWork {
    inner: TrackedRepository<Friend>,
    others_pending: bool,
}

#[async_trait]
impl Repository<Friend> for SharedUnitOfWork {
    async fn get_by_id(&self, id: RecordId) -> Result<Shared<Friend>, CoreError> {
        self.inner.get_by_id(id).await
    }

    async fn get_all(&self) -> Result<Vec<Shared<Friend>>, CoreError> {
        self.inner.get_all().await
    }

    fn add(&self, record: &Shared<Friend>) {
        self.inner.add(record);
    }

    fn remove(&self, record: &Shared<Friend>) {
        self.inner.remove(record);
    }

    async fn save(&self) -> Result<(), CoreError> {
        self.inner.save().await
    }

    fn reject_changes(&self) {
        self.inner.reject_changes();
    }

    fn has_pending_changes(&self) -> bool {
        self.others_pending || self.inner.has_pending_changes()
    }
}

fn set(ws: &mut dyn DetailWorkspace, target: &str, value: &str) {
    ws.set_field(&EditTarget::parse(target), FieldValue::text(value))
        .unwrap();
}

// ── Friend: new record ──────────────────────────────────────────────

#[tokio::test]
async fn test_new_friend_save_scenario() {
    let fx = Fixture::seeded();
    let mut ws = fx.friend_workspace();
    ws.load(None).await.unwrap();

    assert_eq!(ws.state(), WorkspaceState::Ready);
    assert!(ws.has_errors(), "required first name is flagged immediately");
    assert!(ws.has_changes());
    assert!(!ws.commands().save);

    set(&mut ws, "first-name", "Ada");
    assert!(!ws.has_errors());
    assert!(ws.commands().save);

    ws.save().await.unwrap();
    assert!(!ws.has_changes());
    assert_eq!(ws.id(), Some(NEXT));
    assert_eq!(ws.title(), "Ada");
    assert_eq!(
        fx.events(),
        vec![BusEvent::AfterSaved(AfterSaved {
            kind: EntityKind::Friend,
            id: NEXT,
            display_label: "Ada".into(),
        })]
    );
    assert_eq!(fx.db.snapshot().friends[&NEXT].first_name, "Ada");
}

#[tokio::test]
async fn test_new_friend_lookup_starts_with_null_item() {
    let fx = Fixture::seeded();
    let mut ws = fx.friend_workspace();
    ws.load(None).await.unwrap();

    let labels: Vec<&str> = ws.languages().iter().map(|i| i.display_label.as_str()).collect();
    assert_eq!(labels, vec![" - ", "C#", "Rust"]);
    assert_eq!(ws.languages()[0].id, None);
    assert_eq!(ws.title(), "New friend");
}

// ── Friend: existing record ─────────────────────────────────────────

#[tokio::test]
async fn test_load_missing_id_is_not_found() {
    let fx = Fixture::seeded();
    let mut ws = fx.friend_workspace();

    let err = ws.load(Some(RecordId::new(99))).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { kind: EntityKind::Friend, .. }));
    assert_eq!(ws.state(), WorkspaceState::Uninitialized);
    assert!(ws.friend().is_none());
    assert_eq!(ws.phone_numbers().count(), 0);
}

#[tokio::test]
async fn test_reload_leaves_one_listener_per_wrapper() {
    let fx = Fixture::seeded();
    let mut ws = fx.friend_workspace();
    ws.load(Some(ADA)).await.unwrap();
    ws.load(Some(ADA)).await.unwrap();

    assert_eq!(ws.friend().unwrap().listener_count(), 1);
    assert!(ws.phone_numbers().all(|p| p.listener_count() == 1));
    assert_eq!(ws.phone_numbers().count(), 1);
}

#[tokio::test]
async fn test_loaded_friend_is_clean() {
    let fx = Fixture::seeded();
    let mut ws = fx.workspace(EntityKind::Friend);
    ws.load(Some(ADA)).await.unwrap();

    let view = ws.view();
    assert_eq!(view.title, "Ada Lovelace");
    assert_eq!(view.field("favorite_language_id").unwrap().value, FieldValue::Ref(CSHARP));
    assert!(!view.has_changes);
    assert!(!view.commands.save);
    assert!(view.commands.delete);
    assert!(!view.commands.remove_child);
}

#[tokio::test]
async fn test_errors_always_disable_save() {
    let fx = Fixture::seeded();
    let mut ws = fx.workspace(EntityKind::Friend);
    ws.load(Some(ADA)).await.unwrap();

    let too_long = "x".repeat(51);
    let edits: [(&str, &str); 7] = [
        ("first-name", ""),
        ("email", "not-an-email"),
        ("first-name", "Robot"),
        ("first-name", "Augusta"),
        ("email", "ada@example.com"),
        ("last-name", too_long.as_str()),
        ("last-name", "King"),
    ];
    for (field, value) in edits {
        set(ws.as_mut(), field, value);
        if ws.has_errors() {
            assert!(!ws.commands().save, "save enabled with errors after {field}={value}");
        }
    }
    assert!(!ws.has_errors());
    assert!(ws.commands().save);

    set(ws.as_mut(), "first-name", "");
    let err = ws.save().await.unwrap_err();
    assert!(matches!(err, CoreError::CommandUnavailable { command: "save" }));
    assert!(fx.events().is_empty());
}

#[tokio::test]
async fn test_has_changes_is_monotonic() {
    let fx = Fixture::seeded();
    let mut ws = fx.workspace(EntityKind::Friend);
    ws.load(Some(GRACE)).await.unwrap();

    set(ws.as_mut(), "first-name", "Grace Brewster");
    assert!(ws.has_changes());
    set(ws.as_mut(), "first-name", "Grace");
    assert!(ws.has_changes(), "reverting an edit does not clear the flag");

    ws.load(Some(GRACE)).await.unwrap();
    assert!(!ws.has_changes());
}

#[tokio::test]
async fn test_reload_restores_stored_values() {
    let fx = Fixture::seeded();
    let mut ws = fx.workspace(EntityKind::Friend);
    ws.load(Some(GRACE)).await.unwrap();
    set(ws.as_mut(), "first-name", "Edited");
    assert!(ws.has_changes());

    ws.load(Some(GRACE)).await.unwrap();
    let view = ws.view();
    assert_eq!(view.field("first_name").unwrap().value, FieldValue::text("Grace"));
    assert!(!view.has_changes);
    assert!(!view.commands.save);
}

#[tokio::test]
async fn test_reload_restores_removed_phone_number() {
    let fx = Fixture::seeded();
    let mut ws = fx.workspace(EntityKind::Friend);
    ws.load(Some(ADA)).await.unwrap();
    ws.select_child(Some(0)).unwrap();
    ws.remove_child().unwrap();
    assert!(ws.view().children.is_empty());

    ws.load(Some(ADA)).await.unwrap();
    let view = ws.view();
    assert_eq!(view.children.len(), 1);
    assert_eq!(view.children[0].id, ADA_PHONE);
    assert!(!view.has_changes);
}

#[tokio::test]
async fn test_reload_after_new_friend_forgets_it() {
    let fx = Fixture::seeded();
    let mut ws = fx.workspace(EntityKind::Friend);
    ws.load(None).await.unwrap();
    set(ws.as_mut(), "first-name", "Alan");

    ws.load(Some(GRACE)).await.unwrap();
    assert!(!ws.has_changes());
    assert_eq!(ws.title(), "Grace Hopper");
}

#[tokio::test]
async fn test_save_keeps_changes_while_repository_has_others_pending() {
    let fx = Fixture::seeded();
    let repo = SharedUnitOfWork {
        inner: TrackedRepository::new(Arc::clone(&fx.db)),
        others_pending: true,
    };
    let mut ws = FriendWorkspace::new(
        Arc::new(repo),
        Arc::clone(&fx.db) as Arc<dyn LookupService>,
        Arc::clone(&fx.bus),
        Arc::clone(&fx.dialog) as Arc<dyn ConfirmationDialog>,
        WorkspaceConfig::default(),
    );
    ws.load(Some(GRACE)).await.unwrap();
    set(&mut ws, "last-name", "Murray");
    assert!(ws.commands().save);

    ws.save().await.unwrap();
    assert!(ws.has_changes());
    assert!(ws.commands().save);
    assert_eq!(
        fx.events(),
        vec![BusEvent::AfterSaved(AfterSaved {
            kind: EntityKind::Friend,
            id: GRACE,
            display_label: "Grace Murray".into(),
        })]
    );
    assert_eq!(fx.db.snapshot().friends[&GRACE].last_name.as_deref(), Some("Murray"));
}

#[tokio::test]
async fn test_field_errors_are_reported() {
    let fx = Fixture::seeded();
    let mut ws = fx.workspace(EntityKind::Friend);
    ws.load(Some(ADA)).await.unwrap();

    let unknown = ws
        .set_field(&EditTarget::root("nickname"), FieldValue::text("x"))
        .unwrap_err();
    assert!(matches!(unknown, CoreError::UnknownField { .. }));

    let invalid = ws
        .set_field(&EditTarget::root("favorite-language-id"), FieldValue::text("rust"))
        .unwrap_err();
    assert!(matches!(invalid, CoreError::InvalidValue { .. }));
    assert!(!ws.has_changes());

    set(ws.as_mut(), "first-name", "Robot");
    assert_eq!(
        ws.view().errors(),
        vec![("first_name".to_owned(), "Robots are not valid friends".to_owned())]
    );
}

#[tokio::test]
async fn test_edit_before_load_is_invalid_state() {
    let fx = Fixture::seeded();
    let mut ws = fx.workspace(EntityKind::Friend);
    let err = ws
        .set_field(&EditTarget::root("first-name"), FieldValue::text("Ada"))
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidState { .. }));
    assert_eq!(ws.commands(), CommandAvailability::default());
}

// ── Friend: phone numbers ───────────────────────────────────────────

#[tokio::test]
async fn test_add_phone_number_is_validated_and_saved() {
    let fx = Fixture::seeded();
    let mut ws = fx.workspace(EntityKind::Friend);
    ws.load(Some(ADA)).await.unwrap();

    let index = ws.add_child().unwrap();
    assert_eq!(index, 1);
    assert!(ws.has_errors(), "empty phone number is flagged");
    assert!(ws.has_changes());
    assert!(!ws.commands().save);

    set(ws.as_mut(), "1.number", "call me");
    assert!(ws.has_errors());
    set(ws.as_mut(), "1.number", "+1 555 0100");
    assert!(!ws.has_errors());

    ws.save().await.unwrap();
    let view = ws.view();
    assert_eq!(view.children[0].id, ADA_PHONE);
    assert_eq!(view.children[1].id, NEXT);
    assert_eq!(fx.db.snapshot().friends[&ADA].phone_numbers.len(), 2);
}

#[tokio::test]
async fn test_remove_phone_number_needs_selection() {
    let fx = Fixture::seeded();
    let mut ws = fx.workspace(EntityKind::Friend);
    ws.load(Some(ADA)).await.unwrap();

    let err = ws.remove_child().unwrap_err();
    assert!(matches!(err, CoreError::CommandUnavailable { command: "remove" }));

    let err = ws.select_child(Some(3)).unwrap_err();
    assert!(matches!(err, CoreError::ChildOutOfRange { index: 3, len: 1 }));

    ws.select_child(Some(0)).unwrap();
    assert!(ws.commands().remove_child);
    ws.remove_child().unwrap();
    assert!(ws.view().children.is_empty());
    assert!(ws.has_changes());
    assert!(ws.commands().save);

    ws.save().await.unwrap();
    assert!(fx.db.snapshot().friends[&ADA].phone_numbers.is_empty());
}

// ── Friend: persistence failures ────────────────────────────────────

#[tokio::test]
async fn test_failed_save_keeps_changes_and_publishes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let fx = Fixture::failing(&dir);
    let mut ws = fx.workspace(EntityKind::Friend);
    ws.load(Some(ADA)).await.unwrap();
    set(ws.as_mut(), "last-name", "King");

    let err = ws.save().await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(ws.state(), WorkspaceState::Ready);
    assert!(ws.has_changes());
    assert!(ws.commands().save);
    assert!(fx.events().is_empty());
    assert_eq!(fx.db.snapshot().friends[&ADA].last_name.as_deref(), Some("Lovelace"));
}

#[tokio::test]
async fn test_failed_delete_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let fx = Fixture::failing(&dir);
    let mut ws = fx.workspace(EntityKind::Friend);
    ws.load(Some(GRACE)).await.unwrap();

    assert!(ws.delete().await.is_err());
    assert_eq!(ws.state(), WorkspaceState::Ready);
    assert!(!ws.has_changes());
    assert!(ws.commands().delete);
    assert!(fx.events().is_empty());
    assert!(fx.db.snapshot().friends.contains_key(&GRACE));
}

// ── Friend: delete ──────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_confirmed_terminates_workspace() {
    let fx = Fixture::seeded();
    let mut ws = fx.workspace(EntityKind::Friend);
    ws.load(Some(GRACE)).await.unwrap();

    assert_eq!(ws.delete().await.unwrap(), DeleteOutcome::Deleted);
    assert_eq!(ws.state(), WorkspaceState::Terminated);
    assert_eq!(ws.commands(), CommandAvailability::default());
    assert_eq!(fx.dialog.times_asked(), 1);
    assert_eq!(
        fx.events(),
        vec![BusEvent::AfterDeleted(AfterDeleted {
            kind: EntityKind::Friend,
            id: GRACE,
        })]
    );
    assert!(!fx.db.snapshot().friends.contains_key(&GRACE));
}

#[tokio::test]
async fn test_deleted_workspace_cannot_be_reloaded() {
    let fx = Fixture::seeded();
    let mut ws = fx.workspace(EntityKind::Friend);
    ws.load(Some(GRACE)).await.unwrap();
    ws.delete().await.unwrap();

    let err = ws.load(Some(ADA)).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidState { operation: "load", .. }));
    assert_eq!(ws.state(), WorkspaceState::Terminated);
    assert!(ws.view().fields.is_empty());
}

#[tokio::test]
async fn test_delete_cancelled_changes_nothing() {
    let fx = Fixture::new(Database::new(dataset(), None).unwrap(), DialogResult::Cancelled);
    let mut ws = fx.workspace(EntityKind::Friend);
    ws.load(Some(GRACE)).await.unwrap();

    assert_eq!(ws.delete().await.unwrap(), DeleteOutcome::Cancelled);
    assert_eq!(ws.state(), WorkspaceState::Ready);
    assert_eq!(fx.dialog.times_asked(), 1);
    assert!(fx.events().is_empty());
    assert!(fx.db.snapshot().friends.contains_key(&GRACE));
}

// ── Programming languages ───────────────────────────────────────────

#[tokio::test]
async fn test_language_list_add_and_save() {
    let fx = Fixture::seeded();
    let mut ws = fx.workspace(EntityKind::ProgrammingLanguage);
    ws.load(None).await.unwrap();
    assert_eq!(ws.title(), "Programming Languages");
    assert_eq!(ws.view().children.len(), 2);
    assert!(!ws.has_changes());

    let index = ws.add_child().unwrap();
    assert!(ws.has_errors());
    set(ws.as_mut(), &format!("{index}.name"), "F#");
    assert!(ws.commands().save);

    ws.save().await.unwrap();
    let labels: Vec<String> = fx
        .events()
        .into_iter()
        .filter_map(|e| match e {
            BusEvent::AfterSaved(saved) => Some(saved.display_label),
            _ => None,
        })
        .collect();
    assert_eq!(labels, vec!["C#", "Rust", "F#"]);
    assert_eq!(fx.db.snapshot().programming_languages[&NEXT].name, "F#");
}

#[tokio::test]
async fn test_language_removal_is_announced_after_save() {
    let fx = Fixture::seeded();
    let mut ws = fx.workspace(EntityKind::ProgrammingLanguage);
    ws.load(None).await.unwrap();

    ws.select_child(Some(0)).unwrap();
    ws.remove_child().unwrap();
    assert!(ws.has_changes());
    assert!(fx.events().is_empty());

    ws.save().await.unwrap();
    assert!(fx.events().contains(&BusEvent::AfterDeleted(AfterDeleted {
        kind: EntityKind::ProgrammingLanguage,
        id: CSHARP,
    })));
    assert!(!fx.db.snapshot().programming_languages.contains_key(&CSHARP));
}

#[tokio::test]
async fn test_language_list_has_no_delete_or_root_fields() {
    let fx = Fixture::seeded();
    let mut ws = fx.workspace(EntityKind::ProgrammingLanguage);
    ws.load(None).await.unwrap();

    assert!(!ws.commands().delete);
    assert!(matches!(
        ws.delete().await,
        Err(CoreError::Unsupported { operation: "delete", .. })
    ));
    assert!(matches!(
        ws.set_field(&EditTarget::root("name"), FieldValue::text("Go")),
        Err(CoreError::UnknownField { .. })
    ));
}

#[tokio::test]
async fn test_language_reload_discards_unsaved_rows() {
    let fx = Fixture::seeded();
    let mut ws = fx.workspace(EntityKind::ProgrammingLanguage);
    ws.load(None).await.unwrap();
    ws.add_child().unwrap();
    ws.select_child(Some(0)).unwrap();
    ws.remove_child().unwrap();

    ws.load(None).await.unwrap();
    assert_eq!(ws.view().children.len(), 2);
    assert!(!ws.has_changes());
    assert!(!ws.commands().save);
}

#[tokio::test]
async fn test_language_reload_restores_renamed_row() {
    let fx = Fixture::seeded();
    let mut ws = fx.workspace(EntityKind::ProgrammingLanguage);
    ws.load(None).await.unwrap();
    set(ws.as_mut(), "0.name", "Renamed");
    assert!(ws.has_changes());

    ws.load(None).await.unwrap();
    assert_eq!(
        ws.view().children[0].fields[0].value,
        FieldValue::text("C#")
    );
    assert!(!ws.has_changes());
}
