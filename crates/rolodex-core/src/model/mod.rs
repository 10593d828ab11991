// ── Domain model ──
//
// Records the workspaces edit, their persisted row shapes, and the
// identity / value types shared by every layer.

pub mod friend;
pub mod language;
pub mod lookup;
pub mod record_id;
pub mod value;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CoreError;
use crate::store::Dataset;

// ── Re-exports ──────────────────────────────────────────────────────

pub use friend::{Friend, FriendField, FriendRow, PhoneNumber, PhoneNumberField};
pub use language::{ProgrammingLanguage, ProgrammingLanguageField};
pub use lookup::LookupItem;
pub use record_id::{EntityKind, RecordId};
pub use value::FieldValue;

/// A record shared between the change-tracking session that loaded it
/// and the wrapper that edits it.
pub type Shared<T> = Arc<RwLock<T>>;

pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}

/// A persisted aggregate root.
///
/// The store compares rows to detect changes, so `Row` must capture
/// everything that is saved, child collections included.
pub trait Entity: Send + Sync + 'static {
    const KIND: EntityKind;

    type Row: Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static;

    fn id(&self) -> RecordId;

    fn display_label(&self) -> String;

    fn to_row(&self) -> Self::Row;

    fn from_row(row: Self::Row) -> Self;

    fn row_id(row: &Self::Row) -> RecordId;

    /// Give every new (zero-id) part of `row` a fresh id.
    fn assign_ids(
        row: &mut Self::Row,
        next_id: &mut dyn FnMut() -> Result<RecordId, CoreError>,
    ) -> Result<(), CoreError>;

    /// Copy the ids assigned during a save back onto the live record.
    fn accept_ids(&mut self, row: &Self::Row);

    fn table(data: &Dataset) -> &BTreeMap<RecordId, Self::Row>;

    fn table_mut(data: &mut Dataset) -> &mut BTreeMap<RecordId, Self::Row>;
}
