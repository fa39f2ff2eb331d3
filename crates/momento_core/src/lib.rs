//! Core domain logic for the TravelMomento journal.
//! This crate is the single source of truth for journal item invariants.

pub mod db;
pub mod image_source;
pub mod live;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use image_source::{decode_image, ContentResolver, DecodeError, FileContentResolver, ImageRef};
pub use live::{LiveItem, LiveList, Observable, Subscription};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::item::{now_epoch_ms, Item, ItemId, ItemImage, ItemValidationError};
pub use repo::item_repo::{ItemRepository, RepoError, RepoResult, SqliteItemRepository};
pub use service::entry_draft::{EntryDraft, EntryState};
pub use service::item_controller::{
    validate_entry, EntryError, EntryValidationError, ItemController, PendingWrite, WriteError,
};
pub use store::ItemStore;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
