//! Shared, thread-safe journal store.
//!
//! # Responsibility
//! - Own the single SQLite connection shared by every controller in a process.
//! - Republish the full item list after each committed mutation.
//!
//! # Invariants
//! - Physical writes are serialised by the connection lock.
//! - A mutation that committed returns `Ok`, even if republishing fails.
//! - One undecodable photo blob never blocks opening or publishing; that
//!   row is published without its photo.
//! - A poisoned lock surfaces as `DbError::LockPoisoned`, never a panic.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::live::{LiveItem, LiveList, Observable};
use crate::model::item::{Item, ItemId};
use crate::repo::item_repo::{ItemRepository, RepoError, RepoResult, SqliteItemRepository};
use log::{debug, error, warn};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

struct StoreInner {
    conn: Mutex<Connection>,
    items: Observable<Vec<Item>>,
}

/// Cloneable handle to the journal store.
#[derive(Clone)]
pub struct ItemStore {
    inner: Arc<StoreInner>,
}

impl ItemStore {
    /// Opens (or creates) a journal database file.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::from_connection(open_db(path)?)
    }

    /// Opens a private in-memory journal.
    pub fn open_in_memory() -> RepoResult<Self> {
        Self::from_connection(open_db_in_memory()?)
    }

    /// Wraps an already migrated connection and loads the initial snapshot.
    pub fn from_connection(conn: Connection) -> RepoResult<Self> {
        let initial = SqliteItemRepository::new(&conn).list_items_lenient()?;
        Ok(Self {
            inner: Arc::new(StoreInner {
                conn: Mutex::new(conn),
                items: Observable::new(initial),
            }),
        })
    }

    /// Persists a new item and returns its store-assigned id.
    pub fn insert(&self, item: &Item) -> RepoResult<ItemId> {
        let id = self.write("insert", |repo| repo.insert_item(item))?;
        debug!("event=item_insert module=store status=ok item_id={id}");
        Ok(id)
    }

    /// Inserts and reads the row back under the same lock.
    ///
    /// Falls back to the submitted value (with its new id) when the
    /// read-back fails, since the insert already committed.
    pub fn insert_and_get(&self, item: &Item) -> RepoResult<Item> {
        self.write("insert", |repo| {
            let id = repo.insert_item(item)?;
            Ok(read_back_or(repo, id, || item.clone().with_id(id)))
        })
    }

    /// Updates and reads the row back under the same lock.
    pub fn update_and_get(&self, item: &Item) -> RepoResult<Item> {
        let id = item.id.ok_or(RepoError::Unsaved)?;
        self.write("update", |repo| {
            repo.update_item(item)?;
            Ok(read_back_or(repo, id, || item.clone()))
        })
    }

    /// Replaces an existing item; `createdDate` is left untouched.
    pub fn update(&self, item: &Item) -> RepoResult<()> {
        self.write("update", |repo| repo.update_item(item))?;
        debug!(
            "event=item_update module=store status=ok item_id={}",
            item.id.map_or(0, ItemId::get)
        );
        Ok(())
    }

    /// Removes an item. Missing or unsaved items are a no-op.
    pub fn delete(&self, item: &Item) -> RepoResult<()> {
        let Some(id) = item.id else {
            return Ok(());
        };
        let removed = self.write("delete", |repo| repo.delete_item(id))?;
        debug!("event=item_delete module=store status=ok item_id={id} removed={removed}");
        Ok(())
    }

    /// Point lookup of the persisted row.
    pub fn get(&self, id: ItemId) -> RepoResult<Option<Item>> {
        let conn = self.lock()?;
        SqliteItemRepository::new(&conn).get_item(id)
    }

    /// Live view of one row; pending while the row does not exist.
    pub fn get_by_id(&self, id: ItemId) -> LiveItem {
        LiveItem::new(id, self.get_all())
    }

    /// Live view of every row in insertion order.
    pub fn get_all(&self) -> LiveList {
        self.inner.items.subscribe()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Vec<Item> {
        self.inner.items.get()
    }

    fn write<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&SqliteItemRepository<'_>) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let conn = self.lock()?;
        let repo = SqliteItemRepository::new(&conn);
        let value = f(&repo)?;

        // Snapshot is republished under the lock so publishes keep commit order.
        match repo.list_items_lenient() {
            Ok(items) => {
                self.inner.items.set_if_changed(items);
            }
            Err(err) => {
                error!("event=item_publish module=store status=error op={op} error={err}");
            }
        }
        Ok(value)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, DbError> {
        self.inner.conn.lock().map_err(|_| {
            let err = DbError::LockPoisoned;
            error!("event=store_lock module=store status=error error_code={}", err.code());
            err
        })
    }
}

fn read_back_or(
    repo: &SqliteItemRepository<'_>,
    id: ItemId,
    fallback: impl FnOnce() -> Item,
) -> Item {
    match repo.get_item(id) {
        Ok(Some(item)) => item,
        Ok(None) => fallback(),
        Err(err) => {
            warn!("event=item_read_back module=store status=error item_id={id} error={err}");
            fallback()
        }
    }
}
