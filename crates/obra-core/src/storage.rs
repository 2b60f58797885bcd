use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use obra_domain::{EntryKind, Ledger};

use crate::report_service::unreachable_cost_centers;
use crate::CoreError;

/// Describes a persisted backup artifact for the application state.
#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub id: String,
    pub created_at: String,
    pub path: PathBuf,
}

/// Abstraction over persistence backends capable of storing the state document and backups.
pub trait LedgerStorage: Send + Sync {
    fn save(&self, ledger: &Ledger) -> Result<(), CoreError>;
    fn load(&self) -> Result<Ledger, CoreError>;
    fn exists(&self) -> bool;
    fn save_to_path(&self, ledger: &Ledger, path: &Path) -> Result<(), CoreError>;
    fn load_from_path(&self, path: &Path) -> Result<Ledger, CoreError>;
    fn backup(&self, ledger: &Ledger, note: Option<&str>) -> Result<BackupInfo, CoreError>;
    fn list_backups(&self) -> Result<Vec<BackupInfo>, CoreError>;
    fn restore_backup(&self, backup: &BackupInfo) -> Result<Ledger, CoreError>;
}

/// Detects dangling references and other anomalies within a ledger snapshot.
pub fn ledger_warnings(ledger: &Ledger) -> Vec<String> {
    let projects = ledger.projects.iter().map(|p| p.id.as_str()).collect::<HashSet<_>>();
    let suppliers = ledger.suppliers.iter().map(|s| s.id.as_str()).collect::<HashSet<_>>();
    let customers = ledger.customers.iter().map(|c| c.id.as_str()).collect::<HashSet<_>>();
    let accounts = ledger.cash_accounts.iter().map(|a| a.id.as_str()).collect::<HashSet<_>>();
    let categories = ledger.revenue_categories.iter().map(|c| c.id.as_str()).collect::<HashSet<_>>();
    let products = ledger.products.iter().map(|p| p.id.as_str()).collect::<HashSet<_>>();
    let nodes = ledger.cost_centers.iter().map(|n| n.id.as_str()).collect::<HashSet<_>>();
    let entries = ledger.entries.iter().map(|e| e.id.as_str()).collect::<HashSet<_>>();

    let mut warnings = Vec::new();
    for entry in &ledger.entries {
        if !projects.contains(entry.project_id.as_str()) {
            warnings.push(format!(
                "entry {} references unknown project {}",
                entry.id, entry.project_id
            ));
        }
        let counterparties = match entry.kind {
            EntryKind::Expense => &suppliers,
            EntryKind::Revenue => &customers,
        };
        if !counterparties.contains(entry.counterparty_id.as_str()) {
            warnings.push(format!(
                "entry {} references unknown {} {}",
                entry.id,
                entry.kind.counterparty_label(),
                entry.counterparty_id
            ));
        }
        if !accounts.contains(entry.cash_account_id.as_str()) {
            warnings.push(format!(
                "entry {} references unknown cash account {}",
                entry.id, entry.cash_account_id
            ));
        }
        for line in &entry.line_items {
            let targets = match entry.kind {
                EntryKind::Expense => &nodes,
                EntryKind::Revenue => &categories,
            };
            if !targets.contains(line.target_id.as_str()) {
                warnings.push(format!(
                    "line {} of {} references missing target {}",
                    line.id, entry.id, line.target_id
                ));
            }
            if let Some(product) = &line.product_id {
                if !products.contains(product.as_str()) {
                    warnings.push(format!(
                        "line {} of {} references missing product {}",
                        line.id, entry.id, product
                    ));
                }
            }
        }
        if entry.settled_amount > entry.total_amount {
            warnings.push(format!(
                "entry {} is settled beyond its total ({} > {})",
                entry.id, entry.settled_amount, entry.total_amount
            ));
        }
    }

    for settlement in &ledger.settlements {
        if !entries.contains(settlement.entry_id.as_str()) {
            warnings.push(format!(
                "settlement {} references unknown entry {}",
                settlement.id, settlement.entry_id
            ));
        }
        if !accounts.contains(settlement.cash_account_id.as_str()) {
            warnings.push(format!(
                "settlement {} references unknown cash account {}",
                settlement.id, settlement.cash_account_id
            ));
        }
    }

    for node in unreachable_cost_centers(ledger) {
        warnings.push(format!(
            "cost center {} is not reachable from any root",
            node.id
        ));
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_ledger;
    use obra_domain::CostCenter;

    #[test]
    fn seed_ledger_is_clean() {
        assert!(ledger_warnings(&seed_ledger()).is_empty());
    }

    #[test]
    fn orphan_and_cyclic_nodes_are_reported() {
        let mut ledger = seed_ledger();
        ledger
            .cost_centers
            .push(CostCenter::new("cc-loop-a", "A", Some("cc-loop-b".into())));
        ledger
            .cost_centers
            .push(CostCenter::new("cc-loop-b", "B", Some("cc-loop-a".into())));
        let warnings = ledger_warnings(&ledger);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("cc-loop-a"));
    }
}
