// ── Detail workspaces ──
//
// One stateful editor session per record (plus its children). A
// workspace owns its wrappers, derives dirty/valid state from them and
// the repository, and gates its commands on that state.

mod friend;
mod languages;
pub mod registry;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::error::CoreError;
use crate::model::{Entity, EntityKind, FieldValue, LookupItem, RecordId, Shared};
use crate::repository::Repository;
use crate::wrapper::{Editable, EntityWrapper, Listener, ListenerId};

pub use friend::FriendWorkspace;
pub use languages::LanguagesWorkspace;
pub use registry::{WorkspaceFactory, WorkspaceRegistry, WorkspaceServices};

// ── State ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum WorkspaceState {
    Uninitialized,
    Loading,
    Ready,
    Saving,
    Deleting,
    Terminated,
}

/// Which commands may run right now. Recomputed on every query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommandAvailability {
    pub save: bool,
    pub delete: bool,
    pub add_child: bool,
    pub remove_child: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

// ── Edit targets ────────────────────────────────────────────────────

/// Field on the root record, or on child `n` (`"2.number"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTarget {
    pub child: Option<usize>,
    pub field: String,
}

impl EditTarget {
    pub fn root(field: impl Into<String>) -> Self {
        Self {
            child: None,
            field: field.into(),
        }
    }

    pub fn child(index: usize, field: impl Into<String>) -> Self {
        Self {
            child: Some(index),
            field: field.into(),
        }
    }

    /// `"first-name"` targets the root, `"0.number"` the first child.
    pub fn parse(target: &str) -> Self {
        match target.split_once('.') {
            Some((index, field)) => match index.trim().parse() {
                Ok(index) => Self::child(index, field),
                Err(_) => Self::root(target),
            },
            None => Self::root(target),
        }
    }
}

impl fmt::Display for EditTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.child {
            Some(index) => write!(f, "{index}.{}", self.field),
            None => f.write_str(&self.field),
        }
    }
}

// ── Views ───────────────────────────────────────────────────────────

/// Serializable snapshot of a workspace for front ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceView {
    pub kind: EntityKind,
    pub id: Option<RecordId>,
    pub title: String,
    pub state: WorkspaceState,
    pub has_changes: bool,
    pub has_errors: bool,
    pub commands: CommandAvailability,
    pub fields: Vec<FieldView>,
    pub children: Vec<ChildView>,
    pub selected_child: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lookup: Vec<LookupItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub value: FieldValue,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildView {
    pub index: usize,
    pub id: RecordId,
    pub fields: Vec<FieldView>,
}

impl WorkspaceView {
    pub fn field(&self, name: &str) -> Option<&FieldView> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Every validation message, root and children, as `(target, message)`.
    pub fn errors(&self) -> Vec<(String, String)> {
        let root = self
            .fields
            .iter()
            .flat_map(|f| f.errors.iter().map(|e| (f.name.to_owned(), e.clone())));
        let children = self.children.iter().flat_map(|c| {
            c.fields.iter().flat_map(move |f| {
                f.errors
                    .iter()
                    .map(move |e| (format!("{}.{}", c.index, f.name), e.clone()))
            })
        });
        root.chain(children).collect()
    }
}

pub(crate) fn field_views<R: Editable>(wrapper: &EntityWrapper<R>) -> Vec<FieldView> {
    R::Field::iter()
        .map(|field| FieldView {
            name: field.into(),
            label: R::field_label(field),
            value: wrapper.get(field),
            errors: wrapper.errors(field).to_vec(),
        })
        .collect()
}

// ── DetailWorkspace ─────────────────────────────────────────────────

/// Editor session for one record of one entity kind.
///
/// `load` must complete before any other operation; callers await one
/// command before issuing the next.
#[async_trait]
pub trait DetailWorkspace: Send + Sync {
    fn kind(&self) -> EntityKind;

    /// Id of the loaded record; `None` for new records and list editors.
    fn id(&self) -> Option<RecordId>;

    fn title(&self) -> String;

    fn state(&self) -> WorkspaceState;

    /// Unsaved edits exist. Only load, a successful save or a
    /// successful delete clears it.
    fn has_changes(&self) -> bool;

    fn has_errors(&self) -> bool;

    fn commands(&self) -> CommandAvailability;

    fn view(&self) -> WorkspaceView;

    fn set_field(&mut self, target: &EditTarget, value: FieldValue) -> Result<(), CoreError>;

    /// Append a new, immediately validated child. Returns its index.
    fn add_child(&mut self) -> Result<usize, CoreError>;

    fn select_child(&mut self, index: Option<usize>) -> Result<(), CoreError>;

    /// Remove the selected child.
    fn remove_child(&mut self) -> Result<(), CoreError>;

    /// Fetch (or create, for `None` / a zero id) and bind the record.
    async fn load(&mut self, id: Option<RecordId>) -> Result<(), CoreError>;

    async fn save(&mut self) -> Result<(), CoreError>;

    async fn delete(&mut self) -> Result<DeleteOutcome, CoreError>;
}

// ── Shared plumbing ─────────────────────────────────────────────────

/// Monotonic dirty flag shared with the wrapper listeners.
#[derive(Debug, Clone, Default)]
pub(crate) struct ChangeFlag(Arc<AtomicBool>);

impl ChangeFlag {
    pub(crate) fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn set(&self, value: bool) {
        self.0.store(value, Ordering::SeqCst);
    }

    /// Listener that turns the flag on once the repository reports
    /// pending changes. It never turns it off.
    pub(crate) fn listener<R: Entity>(&self, repo: Arc<dyn Repository<R>>) -> Listener {
        let flag = self.clone();
        Arc::new(move |_| {
            if !flag.get() {
                flag.set(repo.has_pending_changes());
            }
        })
    }
}

/// A wrapper together with the workspace's own listener on it.
pub(crate) struct Bound<R: Editable> {
    pub(crate) wrapper: EntityWrapper<R>,
    listener: ListenerId,
}

impl<R: Editable> Bound<R> {
    pub(crate) fn new(record: Shared<R>, listener: Listener) -> Self {
        let mut wrapper = EntityWrapper::new(record);
        let listener = wrapper.subscribe(listener);
        Self { wrapper, listener }
    }

    pub(crate) fn record(&self) -> &Shared<R> {
        self.wrapper.model()
    }

    /// Detach the workspace listener before the wrapper is discarded.
    pub(crate) fn release(mut self) {
        self.wrapper.unsubscribe(self.listener);
    }
}

pub(crate) fn ensure_state(
    state: WorkspaceState,
    operation: &'static str,
) -> Result<(), CoreError> {
    if state == WorkspaceState::Ready {
        Ok(())
    } else {
        Err(CoreError::InvalidState {
            operation,
            state: state.to_string(),
        })
    }
}

/// A deleted workspace cannot be brought back by loading it again.
pub(crate) fn ensure_loadable(state: WorkspaceState) -> Result<(), CoreError> {
    if state == WorkspaceState::Terminated {
        return Err(CoreError::InvalidState {
            operation: "load",
            state: state.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn child_at<T>(items: &mut [T], index: usize) -> Result<&mut T, CoreError> {
    let len = items.len();
    items
        .get_mut(index)
        .ok_or(CoreError::ChildOutOfRange { index, len })
}
