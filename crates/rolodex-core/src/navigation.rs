// ── Navigation list ──
//
// The `{id, label}` list a front end shows for one entity kind. It is
// loaded once from the lookup service and then kept current from the
// after-saved / after-deleted notifications.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use crate::bus::{BusEvent, EventBus, EventKind, NavigationRequest, Subscription};
use crate::error::CoreError;
use crate::model::{EntityKind, RecordId};
use crate::repository::LookupService;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationItem {
    pub id: RecordId,
    pub display_label: String,
}

pub struct NavigationList {
    kind: EntityKind,
    bus: Arc<EventBus>,
    lookup: Arc<dyn LookupService>,
    items: Arc<RwLock<Vec<NavigationItem>>>,
    _subscriptions: [Subscription; 2],
}

impl NavigationList {
    pub fn new(kind: EntityKind, lookup: Arc<dyn LookupService>, bus: Arc<EventBus>) -> Self {
        let items: Arc<RwLock<Vec<NavigationItem>>> = Arc::default();

        let saved_items = Arc::clone(&items);
        let on_saved = bus.subscribe(EventKind::AfterSaved, move |event| {
            if let BusEvent::AfterSaved(saved) = event {
                if saved.kind != kind {
                    return;
                }
                let mut items = saved_items.write();
                match items.iter_mut().find(|item| item.id == saved.id) {
                    Some(item) => item.display_label.clone_from(&saved.display_label),
                    None => items.push(NavigationItem {
                        id: saved.id,
                        display_label: saved.display_label.clone(),
                    }),
                }
            }
        });

        let deleted_items = Arc::clone(&items);
        let on_deleted = bus.subscribe(EventKind::AfterDeleted, move |event| {
            if let BusEvent::AfterDeleted(deleted) = event {
                if deleted.kind == kind {
                    deleted_items.write().retain(|item| item.id != deleted.id);
                }
            }
        });

        Self {
            kind,
            bus,
            lookup,
            items,
            _subscriptions: [on_saved, on_deleted],
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Replace the items with a fresh lookup.
    pub async fn load(&self) -> Result<(), CoreError> {
        let loaded: Vec<NavigationItem> = self
            .lookup
            .lookup_items(self.kind)
            .await?
            .into_iter()
            .filter_map(|item| {
                item.id.map(|id| NavigationItem {
                    id,
                    display_label: item.display_label,
                })
            })
            .collect();
        debug!(kind = %self.kind, count = loaded.len(), "navigation loaded");
        *self.items.write() = loaded;
        Ok(())
    }

    pub fn items(&self) -> Vec<NavigationItem> {
        self.items.read().clone()
    }

    /// Ask for `id` (or a new record) to be opened.
    pub fn open(&self, id: Option<RecordId>) {
        self.bus.publish(NavigationRequest {
            kind: self.kind,
            id: id.and_then(RecordId::persisted),
        });
    }
}
