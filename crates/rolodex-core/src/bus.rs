// ── Navigation event bus ──
//
// In-process publish/subscribe between the navigation list, the detail
// workspaces and the coordinator. Dispatch is synchronous and happens
// in registration order. Handlers are snapshotted before they run, so
// a handler may publish, subscribe or drop subscriptions freely.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use serde::Serialize;
use strum::IntoStaticStr;
use tracing::trace;

use crate::model::{EntityKind, RecordId};

// ── Events ──────────────────────────────────────────────────────────

/// Discriminant used to route events to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum EventKind {
    OpenDetail,
    AfterSaved,
    AfterDeleted,
}

/// Request to show a record in a detail workspace. `id == None` opens
/// a new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavigationRequest {
    pub kind: EntityKind,
    pub id: Option<RecordId>,
}

impl NavigationRequest {
    pub fn open(kind: EntityKind, id: RecordId) -> Self {
        Self {
            kind,
            id: id.persisted(),
        }
    }

    pub fn new_record(kind: EntityKind) -> Self {
        Self { kind, id: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AfterSaved {
    pub kind: EntityKind,
    pub id: RecordId,
    pub display_label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AfterDeleted {
    pub kind: EntityKind,
    pub id: RecordId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum BusEvent {
    OpenDetail(NavigationRequest),
    AfterSaved(AfterSaved),
    AfterDeleted(AfterDeleted),
}

impl BusEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::OpenDetail(_) => EventKind::OpenDetail,
            Self::AfterSaved(_) => EventKind::AfterSaved,
            Self::AfterDeleted(_) => EventKind::AfterDeleted,
        }
    }
}

impl From<NavigationRequest> for BusEvent {
    fn from(request: NavigationRequest) -> Self {
        Self::OpenDetail(request)
    }
}

impl From<AfterSaved> for BusEvent {
    fn from(event: AfterSaved) -> Self {
        Self::AfterSaved(event)
    }
}

impl From<AfterDeleted> for BusEvent {
    fn from(event: AfterDeleted) -> Self {
        Self::AfterDeleted(event)
    }
}

// ── EventBus ────────────────────────────────────────────────────────

pub type Handler = Arc<dyn Fn(&BusEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SubscriptionId(u64);

/// Publish/subscribe hub. Share it as `Arc<EventBus>`.
#[derive(Default)]
pub struct EventBus {
    handlers: DashMap<EventKind, Vec<(SubscriptionId, Handler)>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `handler` for events of `kind`. The handler stays
    /// registered for as long as the returned guard lives.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(self: &Arc<Self>, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        trace!(event = <&str>::from(kind), id = id.0, "subscribed");
        Subscription {
            bus: Arc::downgrade(self),
            kind,
            id,
        }
    }

    /// Deliver `event` to every current subscriber of its kind.
    pub fn publish(&self, event: impl Into<BusEvent>) {
        let event = event.into();
        let kind = event.kind();
        let handlers: Vec<Handler> = self
            .handlers
            .get(&kind)
            .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();
        trace!(
            event = <&str>::from(kind),
            subscribers = handlers.len(),
            "publishing"
        );
        for handler in handlers {
            handler(&event);
        }
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, |list| list.len())
    }

    fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) {
        if let Some(mut list) = self.handlers.get_mut(&kind) {
            list.retain(|(sid, _)| *sid != id);
        }
        trace!(event = <&str>::from(kind), id = id.0, "unsubscribed");
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("kinds", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

// ── Subscription ────────────────────────────────────────────────────

/// RAII registration handle. Dropping it removes the handler.
#[derive(Debug)]
pub struct Subscription {
    bus: Weak<EventBus>,
    kind: EventKind,
    id: SubscriptionId,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Remove the handler now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.kind, self.id);
        }
    }
}
