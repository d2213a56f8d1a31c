//! Tour lifecycle transitions.
//!
//! `close()` archives the running tour and freezes its snapshots, `open()`
//! purges the archived events before a new tour starts. The stores behind
//! each step are separate traits; no step can rely on a transaction spanning
//! more than one of them, so every step is written to be safe to re-run.

mod archive;
mod assets;
#[cfg(test)]
pub mod memory;
mod orchestrator;
mod snapshot;
mod store;

pub use assets::*;
pub use orchestrator::*;
pub use snapshot::*;
pub use store::*;
