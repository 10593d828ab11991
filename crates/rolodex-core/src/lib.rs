//! Editable-entity workspaces for rolodex.
//!
//! This crate owns the editing core shared by every front end:
//!
//! - **[`EntityWrapper`]**: Validating, notifying proxy around one
//!   record. Writes go straight to the record; per-field rule sets decide
//!   the error state.
//!
//! - **[`DetailWorkspace`]**: Editor session for one record of one
//!   [`EntityKind`] (plus its children). Derives dirty/valid state and
//!   gates Save / Delete / Add / Remove on it.
//!
//! - **[`EventBus`]**: Synchronous publish/subscribe channel carrying
//!   open-detail, after-saved and after-deleted notifications. Handlers
//!   are owned through RAII [`Subscription`] guards.
//!
//! - **[`WorkspaceCoordinator`]**: Owns the single active workspace,
//!   guards navigation against silently dropping unsaved changes, and
//!   builds workspaces from a validated [`WorkspaceRegistry`].
//!
//! - **[`NavigationList`]**: `{id, label}` list per entity kind, kept
//!   current from bus notifications.
//!
//! - **Persistence** ([`store`]): JSON-file backed [`Database`] and a
//!   change-tracking [`TrackedRepository`] session, consumed only through
//!   the [`Repository`] / [`LookupService`] traits.

pub mod bus;
pub mod config;
pub mod coordinator;
pub mod dialog;
pub mod error;
pub mod model;
pub mod navigation;
pub mod repository;
pub mod store;
pub mod workspace;
pub mod wrapper;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bus::{
    AfterDeleted, AfterSaved, BusEvent, EventBus, EventKind, NavigationRequest, Subscription,
};
pub use config::WorkspaceConfig;
pub use coordinator::{NavigationOutcome, WorkspaceCoordinator};
pub use dialog::{ConfirmationDialog, DialogResult, StaticDialog};
pub use error::CoreError;
pub use navigation::{NavigationItem, NavigationList};
pub use repository::{LookupService, Repository};
pub use store::{Database, Dataset, TrackedRepository};
pub use workspace::{
    ChildView, CommandAvailability, DeleteOutcome, DetailWorkspace, EditTarget, FieldView,
    FriendWorkspace, LanguagesWorkspace, WorkspaceRegistry, WorkspaceServices, WorkspaceState,
    WorkspaceView,
};
pub use wrapper::{EntityWrapper, PropertyChanged, Rule};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    EntityKind, FieldValue, Friend, FriendField, LookupItem, PhoneNumber, PhoneNumberField,
    ProgrammingLanguage, ProgrammingLanguageField, RecordId,
};
