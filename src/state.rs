//! Single owner of the in-memory application state.
//!
//! Every mutation runs against a working copy, the copy is persisted, and
//! only then does it replace the live ledger. A failed validation or a failed
//! write leaves both memory and disk exactly as they were.

use std::{path::PathBuf, sync::Arc};

use obra_core::{
    storage::{ledger_warnings, BackupInfo, LedgerStorage},
    Clock, CoreResult,
};
use obra_domain::Ledger;
use obra_storage_json::{JsonLedgerStorage, LoadOrigin, StoragePaths};
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};

pub struct StateManager {
    ledger: Ledger,
    storage: Box<dyn LedgerStorage>,
    clock: Arc<dyn Clock>,
    origin: LoadOrigin,
    state_path: Option<PathBuf>,
}

impl StateManager {
    /// Opens the JSON store under `data_root`, seeding or recovering as needed.
    pub fn open(data_root: PathBuf, retention: usize, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let storage = JsonLedgerStorage::with_retention(StoragePaths::under(&data_root), retention)?;
        let outcome = storage.load_or_seed()?;
        let state_path = storage.state_path();
        let manager = Self {
            ledger: outcome.ledger,
            storage: Box::new(storage),
            clock,
            origin: outcome.origin,
            state_path: Some(state_path),
        };
        for warning in manager.warnings() {
            warn!(%warning, "state consistency");
        }
        Ok(manager)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn origin(&self) -> &LoadOrigin {
        &self.origin
    }

    pub fn state_path(&self) -> Option<&PathBuf> {
        self.state_path.as_ref()
    }

    /// Applies `change` to a working copy, persists it, then publishes it.
    pub fn mutate<T>(
        &mut self,
        change: impl FnOnce(&mut Ledger, &dyn Clock) -> CoreResult<T>,
    ) -> AppResult<T> {
        let mut working = self.ledger.clone();
        let output = change(&mut working, self.clock.as_ref())?;
        self.storage.save(&working)?;
        self.ledger = working;
        debug!(updated_at = %self.ledger.updated_at, "state persisted");
        Ok(output)
    }

    /// Writes the current state to disk without changing it.
    pub fn persist(&self) -> AppResult<()> {
        self.storage.save(&self.ledger)?;
        Ok(())
    }

    pub fn backup(&self, note: Option<&str>) -> AppResult<BackupInfo> {
        Ok(self.storage.backup(&self.ledger, note)?)
    }

    pub fn backups(&self) -> AppResult<Vec<BackupInfo>> {
        Ok(self.storage.list_backups()?)
    }

    /// Replaces the live state with a backup identified by its file name.
    pub fn restore(&mut self, backup_id: &str) -> AppResult<BackupInfo> {
        let backup = self
            .backups()?
            .into_iter()
            .find(|info| info.id == backup_id)
            .ok_or_else(|| AppError::BackupNotFound(backup_id.to_string()))?;
        self.ledger = self.storage.restore_backup(&backup)?;
        Ok(backup)
    }

    pub fn warnings(&self) -> Vec<String> {
        ledger_warnings(&self.ledger)
    }
}
