//! Domain model for travel journal entries.
//!
//! # Responsibility
//! - Define the canonical journal item record shared by storage and UI.
//!
//! # Invariants
//! - A persisted item is identified by a store-assigned `ItemId`.
//! - Items are immutable values; updates are full replacements.

pub mod item;
