#![allow(clippy::unwrap_used)]
// Integration tests for navigation: list → bus → coordinator → workspace.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use rolodex_core::model::FriendRow;
use rolodex_core::{
    AfterDeleted, ConfirmationDialog, CoreError, Database, Dataset, DeleteOutcome, DialogResult,
    EditTarget, EntityKind, EventBus, EventKind, FieldValue, Friend, NavigationItem,
    NavigationList, NavigationOutcome, NavigationRequest, ProgrammingLanguage, RecordId,
    StaticDialog, WorkspaceConfig, WorkspaceCoordinator, WorkspaceRegistry, WorkspaceServices,
};

// ── Helpers ─────────────────────────────────────────────────────────

const ADA: RecordId = RecordId::new(2);
const GRACE: RecordId = RecordId::new(3);

struct App {
    bus: Arc<EventBus>,
    dialog: Arc<StaticDialog>,
    coordinator: WorkspaceCoordinator,
    friends: NavigationList,
}

async fn app(answer: DialogResult) -> App {
    let mut data = Dataset::default();
    data.insert::<ProgrammingLanguage>(ProgrammingLanguage {
        id: RecordId::NEW,
        name: "Rust".into(),
    })
    .unwrap();
    for (first, last) in [("Ada", "Lovelace"), ("Grace", "Hopper")] {
        data.insert::<Friend>(FriendRow {
            first_name: first.into(),
            last_name: Some(last.into()),
            ..FriendRow::default()
        })
        .unwrap();
    }

    let bus = EventBus::new();
    let dialog = Arc::new(StaticDialog::new(answer));
    let services = WorkspaceServices::new(
        Arc::new(Database::new(data, None).unwrap()),
        Arc::clone(&bus),
        Arc::clone(&dialog) as Arc<dyn ConfirmationDialog>,
        WorkspaceConfig::default(),
    );
    let coordinator = WorkspaceCoordinator::new(
        &bus,
        WorkspaceRegistry::standard(&services),
        Arc::clone(&services.dialog),
        services.config.clone(),
    )
    .unwrap();
    let friends = NavigationList::new(
        EntityKind::Friend,
        Arc::clone(&services.lookup),
        Arc::clone(&bus),
    );
    friends.load().await.unwrap();

    App {
        bus,
        dialog,
        coordinator,
        friends,
    }
}

impl App {
    async fn open(&mut self, id: Option<RecordId>) -> Vec<NavigationOutcome> {
        self.friends.open(id);
        self.coordinator.process_pending().await.unwrap()
    }

    fn edit(&mut self, field: &str, value: &str) {
        self.coordinator
            .active_mut()
            .unwrap()
            .set_field(&EditTarget::parse(field), FieldValue::text(value))
            .unwrap();
    }

    fn active_ptr(&self) -> *const () {
        self.coordinator
            .active()
            .map_or(std::ptr::null(), |ws| std::ptr::from_ref(ws).cast())
    }

    fn labels(&self) -> Vec<String> {
        self.friends
            .items()
            .into_iter()
            .map(|i| i.display_label)
            .collect()
    }
}

// ── Navigation ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_navigation_list_loads_from_lookup() {
    let app = app(DialogResult::Confirmed).await;
    assert_eq!(
        app.friends.items(),
        vec![
            NavigationItem {
                id: ADA,
                display_label: "Ada Lovelace".into()
            },
            NavigationItem {
                id: GRACE,
                display_label: "Grace Hopper".into()
            },
        ]
    );
}

#[tokio::test]
async fn test_open_through_bus() {
    let mut app = app(DialogResult::Confirmed).await;
    assert_eq!(app.open(Some(ADA)).await, vec![NavigationOutcome::Opened]);

    let active = app.coordinator.active().unwrap();
    assert_eq!(active.kind(), EntityKind::Friend);
    assert_eq!(active.id(), Some(ADA));
    assert_eq!(app.dialog.times_asked(), 0, "clean workspace needs no confirmation");
}

#[tokio::test]
async fn test_declined_navigation_keeps_active_workspace() {
    let mut app = app(DialogResult::Cancelled).await;
    app.open(Some(ADA)).await;
    app.edit("last-name", "King");
    let before = app.active_ptr();

    assert_eq!(app.open(Some(GRACE)).await, vec![NavigationOutcome::Declined]);

    assert_eq!(app.active_ptr(), before);
    let active = app.coordinator.active().unwrap();
    assert_eq!(active.id(), Some(ADA));
    assert!(active.has_changes());
    assert_eq!(active.view().field("last_name").unwrap().value, FieldValue::text("King"));
    assert_eq!(app.dialog.times_asked(), 1);
}

#[tokio::test]
async fn test_confirmed_navigation_loads_fresh_workspace() {
    let mut app = app(DialogResult::Confirmed).await;
    app.open(Some(ADA)).await;
    app.edit("last-name", "King");

    assert_eq!(app.open(Some(GRACE)).await, vec![NavigationOutcome::Opened]);
    let active = app.coordinator.active().unwrap();
    assert_eq!(active.id(), Some(GRACE));
    assert!(!active.has_changes());
    assert_eq!(app.dialog.times_asked(), 1);

    // The discarded edit never reached the store.
    app.open(Some(ADA)).await;
    let ada = app.coordinator.active().unwrap().view();
    assert_eq!(ada.field("last_name").unwrap().value, FieldValue::text("Lovelace"));
}

#[tokio::test]
async fn test_failed_load_keeps_previous_workspace() {
    let mut app = app(DialogResult::Confirmed).await;
    app.open(Some(ADA)).await;
    let before = app.active_ptr();

    app.friends.open(Some(RecordId::new(42)));
    let err = app.coordinator.process_pending().await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
    assert_eq!(app.active_ptr(), before);
}

#[tokio::test]
async fn test_close_asks_when_dirty() {
    let mut app = app(DialogResult::Cancelled).await;
    app.open(Some(ADA)).await;
    assert_eq!(app.coordinator.close(), NavigationOutcome::Closed);
    assert!(app.coordinator.active().is_none());

    app.open(Some(ADA)).await;
    app.edit("first-name", "Augusta");
    assert_eq!(app.coordinator.close(), NavigationOutcome::Declined);
    assert!(app.coordinator.active().is_some());
}

// ── Save / delete through the coordinator ───────────────────────────

#[tokio::test]
async fn test_saving_new_friend_updates_navigation_list() {
    let mut app = app(DialogResult::Confirmed).await;
    app.open(None).await;
    assert!(app.coordinator.active().unwrap().has_errors());

    app.edit("first-name", "Barbara");
    app.edit("last-name", "Liskov");
    app.coordinator.save_active().await.unwrap();

    assert_eq!(app.labels(), vec!["Ada Lovelace", "Grace Hopper", "Barbara Liskov"]);
    assert_eq!(app.coordinator.active().unwrap().id(), Some(RecordId::new(4)));
}

#[tokio::test]
async fn test_renaming_updates_navigation_label() {
    let mut app = app(DialogResult::Confirmed).await;
    app.open(Some(GRACE)).await;
    app.edit("first-name", "Amazing Grace");
    app.coordinator.save_active().await.unwrap();
    assert_eq!(app.labels(), vec!["Ada Lovelace", "Amazing Grace Hopper"]);
}

#[tokio::test]
async fn test_delete_active_clears_workspace_and_list_item() {
    let mut app = app(DialogResult::Confirmed).await;
    app.open(Some(ADA)).await;

    let outcome = app.coordinator.delete_active().await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert!(app.coordinator.active().is_none());
    assert_eq!(app.labels(), vec!["Grace Hopper"]);
}

#[tokio::test]
async fn test_commands_without_active_workspace_fail() {
    let mut app = app(DialogResult::Confirmed).await;
    assert!(matches!(
        app.coordinator.save_active().await,
        Err(CoreError::InvalidState { .. })
    ));
}

#[tokio::test]
async fn test_deleted_elsewhere_clears_active() {
    let mut app = app(DialogResult::Confirmed).await;
    app.open(Some(GRACE)).await;
    app.bus.publish(AfterDeleted {
        kind: EntityKind::Friend,
        id: GRACE,
    });
    app.coordinator.process_pending().await.unwrap();
    assert!(app.coordinator.active().is_none());
    assert_eq!(app.labels(), vec!["Ada Lovelace"]);
}

#[tokio::test]
async fn test_open_language_list_directly() {
    let mut app = app(DialogResult::Confirmed).await;
    let outcome = app
        .coordinator
        .open_detail(NavigationRequest::new_record(EntityKind::ProgrammingLanguage))
        .await
        .unwrap();
    assert_eq!(outcome, NavigationOutcome::Opened);
    assert_eq!(app.coordinator.active().unwrap().view().children.len(), 1);
}

// ── Wiring ──────────────────────────────────────────────────────────

#[test]
fn test_incomplete_registry_is_rejected() {
    let bus = EventBus::new();
    let err = WorkspaceCoordinator::new(
        &bus,
        WorkspaceRegistry::new(),
        Arc::new(StaticDialog::confirming()),
        WorkspaceConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::Configuration { .. }));
    assert_eq!(bus.subscriber_count(EventKind::OpenDetail), 0);
}
