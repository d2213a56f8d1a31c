//! Data models for the tour backend.
//!
//! Field names follow the persisted documents and the admin API contract.

mod event;
mod map;
mod tour;

pub use event::*;
pub use map::*;
pub use tour::*;
