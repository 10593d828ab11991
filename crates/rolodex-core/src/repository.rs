// ── Persistence seams ──
//
// The only surface workspaces see of the store. Reads are async; the
// change set is edited synchronously and flushed by `save`.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::model::{Entity, EntityKind, LookupItem, RecordId, Shared};

/// Unit-of-work style access to one aggregate type.
///
/// Every record handed out is tracked: edits made through the returned
/// handle are what `has_pending_changes` and `save` see.
#[async_trait]
pub trait Repository<R: Entity>: Send + Sync {
    async fn get_by_id(&self, id: RecordId) -> Result<Shared<R>, CoreError>;

    /// All persisted records, minus those marked for deletion.
    async fn get_all(&self) -> Result<Vec<Shared<R>>, CoreError>;

    /// Track `record` as new. Re-adding a record marked for deletion
    /// cancels the deletion.
    fn add(&self, record: &Shared<R>);

    /// Mark `record` for deletion. A record that was only added is
    /// simply forgotten.
    fn remove(&self, record: &Shared<R>);

    /// Flush all pending changes. On failure nothing is applied and the
    /// pending set is kept as it was.
    async fn save(&self) -> Result<(), CoreError>;

    /// Put every tracked record back to its last loaded or saved state,
    /// forget added records and cancel pending deletions.
    fn reject_changes(&self);

    fn has_pending_changes(&self) -> bool;
}

/// Read-only `{id, label}` reference data.
#[async_trait]
pub trait LookupService: Send + Sync {
    async fn lookup_items(&self, kind: EntityKind) -> Result<Vec<LookupItem>, CoreError>;
}
