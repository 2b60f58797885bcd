#![doc(test(attr(deny(warnings))))]

//! Obra Finance tracks the money side of construction projects: reference
//! data, a cost-center tree, expense and revenue entries, their settlements,
//! and the reports built on top of them.

pub mod cli;
pub mod errors;
pub mod state;
pub mod utils;

pub use obra_config as config;
pub use obra_core as core;
pub use obra_domain as domain;
pub use obra_storage_json as storage;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Obra Finance tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
