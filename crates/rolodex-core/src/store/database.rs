// ── Dataset & database ──
//
// The whole dataset lives in memory and is written out as pretty JSON
// on every commit. A commit applies to a copy; the copy only replaces
// the live dataset once the file write succeeded. The file itself is
// written next to the target and renamed over it.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::model::{Entity, EntityKind, Friend, LookupItem, ProgrammingLanguage, RecordId};
use crate::repository::LookupService;

// ── Dataset ─────────────────────────────────────────────────────────

/// Everything that is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    /// Next identifier to hand out. Shared by all tables.
    #[serde(default = "first_id")]
    pub next_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub friends: BTreeMap<RecordId, <Friend as Entity>::Row>,
    #[serde(default)]
    pub programming_languages: BTreeMap<RecordId, ProgrammingLanguage>,
}

fn first_id() -> i64 {
    1
}

impl Default for Dataset {
    fn default() -> Self {
        Self {
            next_id: first_id(),
            last_saved_at: None,
            friends: BTreeMap::new(),
            programming_languages: BTreeMap::new(),
        }
    }
}

impl Dataset {
    pub fn allocate_id(&mut self) -> Result<RecordId, CoreError> {
        let id = RecordId::new(self.next_id);
        self.next_id = self.next_id.checked_add(1).ok_or_else(ids_exhausted)?;
        Ok(id)
    }

    /// Insert `row`, assigning ids to every new part of it.
    pub fn insert<R: Entity>(&mut self, mut row: R::Row) -> Result<RecordId, CoreError> {
        R::assign_ids(&mut row, &mut || self.allocate_id())?;
        let id = R::row_id(&row);
        R::table_mut(self).insert(id, row);
        Ok(id)
    }

    /// Move `next_id` past every id already in use, so hand-edited
    /// files cannot produce collisions.
    fn normalize(&mut self) -> Result<(), CoreError> {
        let used = self
            .friends
            .values()
            .flat_map(|f| std::iter::once(f.id).chain(f.phone_numbers.iter().map(|p| p.id)))
            .chain(self.programming_languages.keys().copied())
            .map(RecordId::get)
            .max()
            .unwrap_or(0);
        let after_used = used.checked_add(1).ok_or_else(ids_exhausted)?;
        self.next_id = self.next_id.max(after_used);
        Ok(())
    }
}

fn ids_exhausted() -> CoreError {
    CoreError::Persistence {
        message: "record identifiers exhausted".into(),
        source: None,
    }
}

// ── Database ────────────────────────────────────────────────────────

/// Shared backing store for every change-tracking session.
#[derive(Debug)]
pub struct Database {
    data: RwLock<Dataset>,
    path: Option<PathBuf>,
}

impl Database {
    /// A database that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            data: RwLock::new(Dataset::default()),
            path: None,
        }
    }

    pub fn new(mut dataset: Dataset, path: Option<PathBuf>) -> Result<Self, CoreError> {
        dataset.normalize()?;
        Ok(Self {
            data: RwLock::new(dataset),
            path,
        })
    }

    /// Load the dataset at `path`. A missing file is an empty dataset;
    /// the file is created on the first commit.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let dataset = match tokio::fs::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => Dataset::default(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                CoreError::persistence(format!("cannot parse {}", path.display()), e)
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "data file missing, starting empty");
                Dataset::default()
            }
            Err(e) => {
                return Err(CoreError::persistence(
                    format!("cannot read {}", path.display()),
                    e,
                ));
            }
        };
        Self::new(dataset, Some(path))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Copy of the current dataset.
    pub fn snapshot(&self) -> Dataset {
        self.data.read().clone()
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.data.read().last_saved_at
    }

    pub(crate) fn row<R: Entity>(&self, id: RecordId) -> Option<R::Row> {
        R::table(&self.data.read()).get(&id).cloned()
    }

    pub(crate) fn rows<R: Entity>(&self) -> Vec<R::Row> {
        R::table(&self.data.read()).values().cloned().collect()
    }

    /// Apply `change` to a copy of the dataset, persist the copy and
    /// then make it current. Either all of it lands or nothing does.
    pub(crate) async fn commit<T, F>(&self, change: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut Dataset) -> Result<T, CoreError> + Send,
        T: Send,
    {
        let mut next = self.data.read().clone();
        let out = change(&mut next)?;
        next.last_saved_at = Some(Utc::now());

        if let Some(path) = &self.path {
            write_dataset(path, &next).await?;
        }

        *self.data.write() = next;
        info!(path = ?self.path, "dataset committed");
        Ok(out)
    }
}

async fn write_dataset(path: &Path, dataset: &Dataset) -> Result<(), CoreError> {
    let json = serde_json::to_string_pretty(dataset)
        .map_err(|e| CoreError::persistence("cannot serialize dataset", e))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            CoreError::persistence(format!("cannot create {}", parent.display()), e)
        })?;
    }

    // The data file is only ever replaced by rename, never rewritten in place.
    let temp = temp_path(path);
    let written = write_synced(&temp, json.as_bytes()).await;
    let result = match written {
        Ok(()) => tokio::fs::rename(&temp, path).await.map_err(|e| {
            CoreError::persistence(format!("cannot replace {}", path.display()), e)
        }),
        Err(e) => Err(CoreError::persistence(format!("cannot write {}", temp.display()), e)),
    };
    if result.is_err() {
        let _ = tokio::fs::remove_file(&temp).await;
    }
    result
}

async fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// `data.json` -> `data.json.tmp`, in the same directory.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[async_trait]
impl LookupService for Database {
    async fn lookup_items(&self, kind: EntityKind) -> Result<Vec<LookupItem>, CoreError> {
        let items = match kind {
            EntityKind::Friend => self
                .rows::<Friend>()
                .into_iter()
                .map(|row| {
                    let id = row.id;
                    LookupItem::new(id, Friend::from_row(row).display_label())
                })
                .collect(),
            EntityKind::ProgrammingLanguage => self
                .rows::<ProgrammingLanguage>()
                .into_iter()
                .map(|row| LookupItem::new(row.id, row.name))
                .collect(),
        };
        Ok(items)
    }
}
