//! Journal use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into form-level operations.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod entry_draft;
pub mod item_controller;
