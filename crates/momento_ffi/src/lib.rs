//! Flutter-facing bindings for the journal core.

pub mod api;
