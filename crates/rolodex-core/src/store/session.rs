// ── Change-tracking session ──
//
// Identity map plus snapshot change tracker over one table of the
// database. Each detail workspace gets its own session, so pending
// changes never leak between editors.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::Database;
use crate::error::CoreError;
use crate::model::{Entity, RecordId, Shared, shared};
use crate::repository::Repository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryState {
    Added,
    Unchanged,
    Deleted,
}

struct Entry<R: Entity> {
    record: Shared<R>,
    /// Row as last loaded or saved. `None` for added records.
    original: Option<R::Row>,
    state: EntryState,
}

impl<R: Entity> Entry<R> {
    fn is_pending(&self) -> bool {
        match self.state {
            EntryState::Added | EntryState::Deleted => true,
            EntryState::Unchanged => self
                .original
                .as_ref()
                .is_none_or(|original| *original != self.record.read().to_row()),
        }
    }
}

/// [`Repository`] implementation backed by a [`Database`].
pub struct TrackedRepository<R: Entity> {
    db: Arc<Database>,
    entries: Mutex<Vec<Entry<R>>>,
}

impl<R: Entity> TrackedRepository<R> {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Number of records the session is tracking.
    pub fn tracked(&self) -> usize {
        self.entries.lock().len()
    }

    /// Hand out the tracked instance for `row`, tracking it first if
    /// needed. Returns `None` when the record is marked for deletion.
    fn attach(entries: &mut Vec<Entry<R>>, row: R::Row) -> Option<Shared<R>> {
        let id = R::row_id(&row);
        if let Some(entry) = entries.iter().find(|e| e.record.read().id() == id) {
            return (entry.state != EntryState::Deleted).then(|| Arc::clone(&entry.record));
        }
        let record = shared(R::from_row(row.clone()));
        entries.push(Entry {
            record: Arc::clone(&record),
            original: Some(row),
            state: EntryState::Unchanged,
        });
        Some(record)
    }
}

#[async_trait]
impl<R: Entity> Repository<R> for TrackedRepository<R> {
    async fn get_by_id(&self, id: RecordId) -> Result<Shared<R>, CoreError> {
        let not_found = || CoreError::NotFound { kind: R::KIND, id };
        if id.is_new() {
            return Err(not_found());
        }
        let row = {
            let entries = self.entries.lock();
            if let Some(entry) = entries.iter().find(|e| e.record.read().id() == id) {
                return if entry.state == EntryState::Deleted {
                    Err(not_found())
                } else {
                    Ok(Arc::clone(&entry.record))
                };
            }
            self.db.row::<R>(id)
        };
        let row = row.ok_or_else(not_found)?;
        Self::attach(&mut self.entries.lock(), row).ok_or_else(not_found)
    }

    async fn get_all(&self) -> Result<Vec<Shared<R>>, CoreError> {
        let rows = self.db.rows::<R>();
        let mut entries = self.entries.lock();
        Ok(rows
            .into_iter()
            .filter_map(|row| Self::attach(&mut entries, row))
            .collect())
    }

    fn add(&self, record: &Shared<R>) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.iter_mut().find(|e| Arc::ptr_eq(&e.record, record)) {
            if entry.state == EntryState::Deleted {
                entry.state = if entry.original.is_some() {
                    EntryState::Unchanged
                } else {
                    EntryState::Added
                };
            }
            return;
        }
        entries.push(Entry {
            record: Arc::clone(record),
            original: None,
            state: EntryState::Added,
        });
    }

    fn remove(&self, record: &Shared<R>) {
        let mut entries = self.entries.lock();
        let Some(pos) = entries.iter().position(|e| Arc::ptr_eq(&e.record, record)) else {
            return;
        };
        if entries[pos].state == EntryState::Added {
            entries.remove(pos);
        } else {
            entries[pos].state = EntryState::Deleted;
        }
    }

    async fn save(&self) -> Result<(), CoreError> {
        let mut upserts: Vec<(Shared<R>, R::Row)> = Vec::new();
        let mut deletes: Vec<RecordId> = Vec::new();
        {
            let entries = self.entries.lock();
            for entry in entries.iter().filter(|e| e.is_pending()) {
                let record = entry.record.read();
                if entry.state == EntryState::Deleted {
                    if let Some(id) = record.id().persisted() {
                        deletes.push(id);
                    }
                } else {
                    upserts.push((Arc::clone(&entry.record), record.to_row()));
                }
            }
        }
        if upserts.is_empty() && deletes.is_empty() {
            debug!(kind = %R::KIND, "nothing to save");
            return Ok(());
        }

        let rows: Vec<R::Row> = upserts.iter().map(|(_, row)| row.clone()).collect();
        let removed = deletes.clone();
        let saved = self
            .db
            .commit(move |data| {
                let table = R::table_mut(data);
                for id in &removed {
                    table.remove(id);
                }
                rows.into_iter()
                    .map(|mut row| {
                        R::assign_ids(&mut row, &mut || data.allocate_id())?;
                        R::table_mut(data).insert(R::row_id(&row), row.clone());
                        Ok(row)
                    })
                    .collect::<Result<Vec<_>, CoreError>>()
            })
            .await?;

        let mut entries = self.entries.lock();
        for ((record, _), row) in upserts.iter().zip(saved) {
            record.write().accept_ids(&row);
            if let Some(entry) = entries.iter_mut().find(|e| Arc::ptr_eq(&e.record, record)) {
                entry.original = Some(row);
                entry.state = EntryState::Unchanged;
            }
        }
        entries.retain(|e| e.state != EntryState::Deleted);
        info!(
            kind = %R::KIND,
            saved = upserts.len(),
            deleted = deletes.len(),
            "changes saved"
        );
        Ok(())
    }

    fn reject_changes(&self) {
        let mut entries = self.entries.lock();
        entries.retain(|e| e.state != EntryState::Added);
        for entry in entries.iter_mut() {
            entry.state = EntryState::Unchanged;
            let Some(original) = &entry.original else {
                continue;
            };
            let edited = *original != entry.record.read().to_row();
            if edited {
                // Children are rebuilt from the row; the root keeps its identity.
                *entry.record.write() = R::from_row(original.clone());
            }
        }
        debug!(kind = %R::KIND, tracked = entries.len(), "changes rejected");
    }

    fn has_pending_changes(&self) -> bool {
        self.entries.lock().iter().any(Entry::is_pending)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Friend, FriendRow, PhoneNumber, ProgrammingLanguage};
    use crate::store::Dataset;

    fn seeded() -> Arc<Database> {
        let mut data = Dataset::default();
        data.insert::<Friend>(FriendRow {
            first_name: "Ada".into(),
            ..FriendRow::default()
        })
        .unwrap();
        Arc::new(Database::new(data, None).unwrap())
    }

    #[tokio::test]
    async fn identity_map_returns_same_instance() {
        let repo = TrackedRepository::<Friend>::new(seeded());
        let a = repo.get_by_id(RecordId::new(1)).await.unwrap();
        let b = repo.get_by_id(RecordId::new(1)).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        let all = repo.get_all().await.unwrap();
        assert!(Arc::ptr_eq(&a, &all[0]));
        assert_eq!(repo.tracked(), 1);
    }

    #[tokio::test]
    async fn missing_id_is_not_found() {
        let repo = TrackedRepository::<Friend>::new(seeded());
        let err = repo.get_by_id(RecordId::new(99)).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
        assert!(repo.get_by_id(RecordId::NEW).await.is_err());
    }

    #[tokio::test]
    async fn edits_and_child_edits_are_pending() {
        let repo = TrackedRepository::<Friend>::new(seeded());
        let friend = repo.get_by_id(RecordId::new(1)).await.unwrap();
        assert!(!repo.has_pending_changes());

        friend.write().first_name = "Ada".into();
        assert!(!repo.has_pending_changes(), "same value is not a change");

        friend.write().phone_numbers.push(shared(PhoneNumber::default()));
        assert!(repo.has_pending_changes());
    }

    #[tokio::test]
    async fn save_assigns_ids_and_clears_pending() {
        let db = seeded();
        let repo = TrackedRepository::<Friend>::new(Arc::clone(&db));
        let friend = shared(Friend {
            first_name: "Grace".into(),
            phone_numbers: vec![shared(PhoneNumber {
                id: RecordId::NEW,
                number: "555".into(),
            })],
            ..Friend::default()
        });
        repo.add(&friend);
        assert!(repo.has_pending_changes());

        repo.save().await.unwrap();
        assert!(!repo.has_pending_changes());
        let id = friend.read().id;
        assert_eq!(id, RecordId::new(2));
        assert_eq!(friend.read().phone_numbers[0].read().id, RecordId::new(3));
        assert_eq!(db.row::<Friend>(id).unwrap().first_name, "Grace");
    }

    #[tokio::test]
    async fn remove_then_add_cancels_deletion() {
        let repo = TrackedRepository::<Friend>::new(seeded());
        let friend = repo.get_by_id(RecordId::new(1)).await.unwrap();
        repo.remove(&friend);
        assert!(repo.has_pending_changes());
        assert!(repo.get_all().await.unwrap().is_empty());
        repo.add(&friend);
        assert!(!repo.has_pending_changes());
    }

    #[tokio::test]
    async fn removing_an_added_record_forgets_it() {
        let repo = TrackedRepository::<ProgrammingLanguage>::new(Arc::new(Database::in_memory()));
        let lang = shared(ProgrammingLanguage::default());
        repo.add(&lang);
        repo.remove(&lang);
        assert!(!repo.has_pending_changes());
        assert_eq!(repo.tracked(), 0);
    }

    #[tokio::test]
    async fn reject_changes_restores_loaded_rows() {
        let repo = TrackedRepository::<Friend>::new(seeded());
        let friend = repo.get_by_id(RecordId::new(1)).await.unwrap();
        friend.write().first_name = "Edited".into();
        friend.write().phone_numbers.push(shared(PhoneNumber::default()));
        let added = shared(Friend::default());
        repo.add(&added);
        assert!(repo.has_pending_changes());

        repo.reject_changes();
        assert!(!repo.has_pending_changes());
        assert_eq!(repo.tracked(), 1);
        let again = repo.get_by_id(RecordId::new(1)).await.unwrap();
        assert!(Arc::ptr_eq(&friend, &again));
        assert_eq!(again.read().first_name, "Ada");
        assert!(again.read().phone_numbers.is_empty());
    }

    #[tokio::test]
    async fn reject_changes_cancels_deletion() {
        let repo = TrackedRepository::<Friend>::new(seeded());
        let friend = repo.get_by_id(RecordId::new(1)).await.unwrap();
        repo.remove(&friend);
        repo.reject_changes();
        assert!(!repo.has_pending_changes());
        assert_eq!(repo.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_deletes_rows() {
        let db = seeded();
        let repo = TrackedRepository::<Friend>::new(Arc::clone(&db));
        let friend = repo.get_by_id(RecordId::new(1)).await.unwrap();
        repo.remove(&friend);
        repo.save().await.unwrap();
        assert!(db.row::<Friend>(RecordId::new(1)).is_none());
        assert_eq!(repo.tracked(), 0);
    }

    #[tokio::test]
    async fn failed_save_keeps_pending_changes() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(Dataset::default(), Some(dir.path().to_path_buf())).unwrap();
        let db = Arc::new(db);
        let repo = TrackedRepository::<ProgrammingLanguage>::new(Arc::clone(&db));
        let lang = shared(ProgrammingLanguage {
            id: RecordId::NEW,
            name: "Rust".into(),
        });
        repo.add(&lang);

        assert!(repo.save().await.is_err());
        assert!(repo.has_pending_changes());
        assert!(lang.read().id.is_new());
        assert!(db.snapshot().programming_languages.is_empty());
    }
}
