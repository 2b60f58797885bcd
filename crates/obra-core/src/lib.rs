//! obra-core
//!
//! Business rules for the construction finance ledger.
//! Depends on obra-domain. No CLI, no terminal I/O, no direct storage interactions.

pub mod cost_center_service;
pub mod csv;
pub mod entity_service;
pub mod entry_service;
pub mod error;
pub mod format;
pub mod ids;
pub mod report_service;
pub mod seed;
pub mod settlement_service;
pub mod storage;
pub mod time;
pub mod totals;

pub use cost_center_service::*;
pub use entity_service::*;
pub use entry_service::*;
pub use error::{CoreError, CoreResult};
pub use ids::{IdGenerator, SequenceKind};
pub use report_service::*;
pub use settlement_service::*;
pub use time::{Clock, FixedClock, SystemClock};
