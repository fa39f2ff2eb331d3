//! Create/edit form state for one journal entry.
//!
//! # Responsibility
//! - Hold raw form input (title, content, picked photo) between edits.
//! - Route a save to insert (create mode) or update (edit mode).
//! - Track the entry lifecycle `Unsaved -> Saved -> Deleted`.
//!
//! # Invariants
//! - Edit mode always forwards the original `created_at`.
//! - A freshly picked photo replaces the stored one; otherwise the stored
//!   photo is kept.
//! - `Deleted` is terminal.

use crate::image_source::ImageRef;
use crate::model::item::{Item, ItemId};
use crate::service::item_controller::{EntryError, ItemController};

/// Controller-side lifecycle of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Unsaved,
    Saved(ItemId),
    Deleted(ItemId),
}

/// Form input for creating or editing one entry.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    state: EntryState,
    title: String,
    content: String,
    selected_image: Option<ImageRef>,
    saved: Option<Item>,
}

impl Default for EntryDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryDraft {
    /// Empty draft in create mode.
    pub fn new() -> Self {
        Self {
            state: EntryState::Unsaved,
            title: String::new(),
            content: String::new(),
            selected_image: None,
            saved: None,
        }
    }

    /// Draft bound to an existing item. Unsaved items start in create mode.
    pub fn edit(item: Item) -> Self {
        let id = item.id;
        let title = item.title.clone();
        let content = item.content.clone();
        Self {
            state: id.map_or(EntryState::Unsaved, EntryState::Saved),
            title,
            content,
            selected_image: None,
            saved: id.map(|_| item),
        }
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn selected_image(&self) -> Option<&ImageRef> {
        self.selected_image.as_ref()
    }

    /// Last persisted value known to this draft.
    pub fn saved_item(&self) -> Option<&Item> {
        self.saved.as_ref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn select_image(&mut self, source: ImageRef) {
        self.selected_image = Some(source);
    }

    pub fn is_valid(&self, controller: &ItemController) -> bool {
        controller.is_entry_valid(&self.title, &self.content)
    }

    /// Saves the draft and waits for the write to complete.
    ///
    /// Create mode inserts; edit mode replaces the bound item.
    pub async fn save(&mut self, controller: &ItemController) -> Result<Item, EntryError> {
        let pending = match (self.state, self.saved.as_ref()) {
            (EntryState::Deleted(id), _) => return Err(EntryError::Deleted(id)),
            (EntryState::Saved(id), Some(saved)) => {
                let image =
                    controller.resolve_image(self.selected_image.as_ref(), saved.image.as_ref())?;
                controller.update(id, &self.title, &self.content, image, saved.created_at)?
            }
            _ => controller.add_new(&self.title, &self.content, self.selected_image.as_ref())?,
        };

        let persisted = pending.wait().await?;
        if let Some(id) = persisted.id {
            self.state = EntryState::Saved(id);
        }
        self.selected_image = None;
        self.saved = Some(persisted.clone());
        Ok(persisted)
    }

    /// Deletes the bound item and waits for completion.
    ///
    /// Unsaved and already deleted drafts are a no-op.
    pub async fn delete(&mut self, controller: &ItemController) -> Result<(), EntryError> {
        match (self.state, self.saved.as_ref()) {
            (EntryState::Deleted(_), _) | (EntryState::Unsaved, _) => Ok(()),
            (EntryState::Saved(id), saved) => {
                let target = saved.cloned().unwrap_or_else(|| {
                    Item::new(self.title.clone(), self.content.clone()).with_id(id)
                });
                controller.delete(&target).wait().await?;
                self.state = EntryState::Deleted(id);
                Ok(())
            }
        }
    }
}
