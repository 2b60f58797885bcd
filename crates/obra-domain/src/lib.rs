//! obra-domain
//!
//! Pure domain models for the construction finance ledger (reference entities,
//! cost centers, financial entries, settlements).
//! No I/O, no CLI, no storage. Only data types and core enums.

pub mod common;
pub mod cost_center;
pub mod entity;
pub mod entry;
pub mod ledger;
pub mod settlement;

pub use common::*;
pub use cost_center::*;
pub use entity::*;
pub use entry::*;
pub use ledger::*;
pub use settlement::*;
