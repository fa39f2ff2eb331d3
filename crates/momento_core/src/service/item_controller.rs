//! Journal entry controller.
//!
//! # Responsibility
//! - Validate form input before any store call.
//! - Decode picked photos and stamp created/modified timestamps.
//! - Submit writes off the caller's thread and expose live reads.
//!
//! # Invariants
//! - Blank title or content never reaches the store.
//! - Inserts stamp `created_at == modified_at`.
//! - Updates carry the caller-preserved `created_at`; the store never
//!   rewrites it anyway.
//! - Writes are fire-and-forget and unordered relative to each other. Callers
//!   needing order await the previous `PendingWrite`.

use crate::image_source::{decode_image, ContentResolver, DecodeError, ImageRef};
use crate::live::{LiveItem, LiveList};
use crate::model::item::{now_epoch_ms, Item, ItemId, ItemImage};
use crate::repo::item_repo::{RepoError, RepoResult};
use crate::store::ItemStore;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Blank form field rejected before persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryValidationError {
    BlankTitle,
    BlankContent,
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "title must not be blank"),
            Self::BlankContent => write!(f, "content must not be blank"),
        }
    }
}

impl Error for EntryValidationError {}

/// Failure of a submitted write, observed through `PendingWrite::wait`.
#[derive(Debug)]
pub enum WriteError {
    Repo(RepoError),
    /// Background task panicked or was cancelled by runtime shutdown.
    Aborted(String),
}

impl Display for WriteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Aborted(message) => write!(f, "write aborted: {message}"),
        }
    }
}

impl Error for WriteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Aborted(_) => None,
        }
    }
}

impl From<RepoError> for WriteError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Controller-level error.
#[derive(Debug)]
pub enum EntryError {
    Validation(EntryValidationError),
    Decode(DecodeError),
    /// Entry was deleted; no further operations apply.
    Deleted(ItemId),
    Write(WriteError),
}

impl Display for EntryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Decode(err) => write!(f, "{err}"),
            Self::Deleted(id) => write!(f, "item {id} was deleted"),
            Self::Write(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EntryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::Deleted(_) => None,
            Self::Write(err) => Some(err),
        }
    }
}

impl From<EntryValidationError> for EntryError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DecodeError> for EntryError {
    fn from(value: DecodeError) -> Self {
        Self::Decode(value)
    }
}

impl From<WriteError> for EntryError {
    fn from(value: WriteError) -> Self {
        Self::Write(value)
    }
}

/// Completion signal of a submitted write.
///
/// Dropping it does not cancel the write; failures are logged either way.
#[derive(Debug)]
#[must_use = "await `wait()` to observe completion"]
pub struct PendingWrite<T> {
    handle: JoinHandle<RepoResult<T>>,
}

impl<T> PendingWrite<T> {
    pub async fn wait(self) -> Result<T, WriteError> {
        match self.handle.await {
            Ok(result) => result.map_err(WriteError::from),
            Err(err) => Err(WriteError::Aborted(err.to_string())),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Mediator between the presentation layer and the shared store.
pub struct ItemController {
    store: ItemStore,
    resolver: Arc<dyn ContentResolver>,
    runtime: Handle,
    all_items: LiveList,
}

impl ItemController {
    /// Builds a controller; writes run on `runtime`'s blocking pool.
    pub fn new(store: ItemStore, resolver: Arc<dyn ContentResolver>, runtime: Handle) -> Self {
        let all_items = store.get_all();
        Self {
            store,
            resolver,
            runtime,
            all_items,
        }
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    /// Live list of every item.
    pub fn all_items(&self) -> LiveList {
        self.all_items.clone()
    }

    pub fn is_entry_valid(&self, title: &str, content: &str) -> bool {
        validate_entry(title, content).is_ok()
    }

    /// Validates, decodes the optional photo, stamps both dates and submits
    /// an insert. Resolves to the persisted item.
    pub fn add_new(
        &self,
        title: &str,
        content: &str,
        image_source: Option<&ImageRef>,
    ) -> Result<PendingWrite<Item>, EntryError> {
        validate_entry(title, content)?;
        let image = self.decode_image(image_source)?;

        let now = now_epoch_ms();
        let item = Item::new(title, content)
            .with_image(image)
            .with_timestamps(Some(now), Some(now));

        Ok(self.submit("insert", move |store| store.insert_and_get(&item)))
    }

    /// Validates and submits a full replacement of item `id`.
    ///
    /// `created_at` must be the value read from the edited item; it is
    /// carried as-is and never re-fetched here.
    pub fn update(
        &self,
        id: ItemId,
        title: &str,
        content: &str,
        image: Option<ItemImage>,
        created_at: Option<i64>,
    ) -> Result<PendingWrite<Item>, EntryError> {
        validate_entry(title, content)?;

        let now = now_epoch_ms();
        let modified_at = created_at.map_or(now, |created| now.max(created));
        let item = Item::new(title, content)
            .with_id(id)
            .with_image(image)
            .with_timestamps(created_at, Some(modified_at));

        Ok(self.submit("update", move |store| store.update_and_get(&item)))
    }

    /// Submits a delete. Deleting a missing item succeeds.
    pub fn delete(&self, item: &Item) -> PendingWrite<()> {
        let item = item.clone();
        self.submit("delete", move |store| store.delete(&item))
    }

    /// Live view of one item by id.
    pub fn retrieve(&self, id: ItemId) -> LiveItem {
        self.store.get_by_id(id)
    }

    /// Resolves and decodes a photo source; `None` in, `None` out.
    pub fn decode_image(
        &self,
        source: Option<&ImageRef>,
    ) -> Result<Option<ItemImage>, DecodeError> {
        decode_image(self.resolver.as_ref(), source)
    }

    /// Picks the photo for an update: a freshly picked source wins over the
    /// previously stored image.
    pub fn resolve_image(
        &self,
        new_source: Option<&ImageRef>,
        previous: Option<&ItemImage>,
    ) -> Result<Option<ItemImage>, DecodeError> {
        match self.decode_image(new_source)? {
            Some(fresh) => Ok(Some(fresh)),
            None => Ok(previous.cloned()),
        }
    }

    fn submit<T, F>(&self, op: &'static str, f: F) -> PendingWrite<T>
    where
        T: Send + 'static,
        F: FnOnce(&ItemStore) -> RepoResult<T> + Send + 'static,
    {
        let store = self.store.clone();
        let handle = self.runtime.spawn_blocking(move || {
            let started_at = Instant::now();
            let result = f(&store);
            match &result {
                Ok(_) => info!(
                    "event=item_write module=controller status=ok op={} duration_ms={}",
                    op,
                    started_at.elapsed().as_millis()
                ),
                Err(err) if err.is_storage() => error!(
                    "event=item_write module=controller status=error op={} duration_ms={} error_code=storage error={}",
                    op,
                    started_at.elapsed().as_millis(),
                    err
                ),
                Err(err) => warn!(
                    "event=item_write module=controller status=error op={} duration_ms={} error={}",
                    op,
                    started_at.elapsed().as_millis(),
                    err
                ),
            }
            result
        });
        PendingWrite { handle }
    }
}

/// Rejects a title or content that is blank after trimming.
pub fn validate_entry(title: &str, content: &str) -> Result<(), EntryValidationError> {
    if title.trim().is_empty() {
        return Err(EntryValidationError::BlankTitle);
    }
    if content.trim().is_empty() {
        return Err(EntryValidationError::BlankContent);
    }
    Ok(())
}
