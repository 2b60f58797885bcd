//! The persisted application-state document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::*;
use crate::cost_center::CostCenter;
use crate::entity::*;
use crate::entry::{EntryKind, FinancialEntry};
use crate::settlement::Settlement;

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Last issued value for each sequenced identifier kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct IdCounters {
    #[serde(default)]
    pub expense: u32,
    #[serde(default)]
    pub revenue: u32,
    #[serde(default)]
    pub payment: u32,
    #[serde(default)]
    pub receipt: u32,
    #[serde(default)]
    pub cost_center: u32,
    #[serde(default)]
    pub line_item: u32,
}

/// Every collection the application owns, saved and loaded as one unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ledger {
    #[serde(default = "Ledger::schema_version_default")]
    pub schema_version: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub counters: IdCounters,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub suppliers: Vec<Supplier>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub cash_accounts: Vec<CashAccount>,
    #[serde(default)]
    pub revenue_categories: Vec<RevenueCategory>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub cost_centers: Vec<CostCenter>,
    #[serde(default)]
    pub entries: Vec<FinancialEntry>,
    #[serde(default)]
    pub settlements: Vec<Settlement>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            created_at: now,
            updated_at: now,
            counters: IdCounters::default(),
            projects: Vec::new(),
            suppliers: Vec::new(),
            customers: Vec::new(),
            cash_accounts: Vec::new(),
            revenue_categories: Vec::new(),
            products: Vec::new(),
            cost_centers: Vec::new(),
            entries: Vec::new(),
            settlements: Vec::new(),
        }
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        find_by_id(&self.projects, id)
    }

    pub fn supplier(&self, id: &str) -> Option<&Supplier> {
        find_by_id(&self.suppliers, id)
    }

    pub fn customer(&self, id: &str) -> Option<&Customer> {
        find_by_id(&self.customers, id)
    }

    pub fn cash_account(&self, id: &str) -> Option<&CashAccount> {
        find_by_id(&self.cash_accounts, id)
    }

    pub fn revenue_category(&self, id: &str) -> Option<&RevenueCategory> {
        find_by_id(&self.revenue_categories, id)
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        find_by_id(&self.products, id)
    }

    pub fn cost_center(&self, id: &str) -> Option<&CostCenter> {
        find_by_id(&self.cost_centers, id)
    }

    pub fn entry(&self, id: &str) -> Option<&FinancialEntry> {
        find_by_id(&self.entries, id)
    }

    pub fn entry_mut(&mut self, id: &str) -> Option<&mut FinancialEntry> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    pub fn entries_of(&self, kind: EntryKind) -> impl Iterator<Item = &FinancialEntry> {
        self.entries.iter().filter(move |entry| entry.kind == kind)
    }

    pub fn settlements_for(&self, entry_id: &str) -> impl Iterator<Item = &Settlement> + '_ {
        let entry_id = entry_id.to_string();
        self.settlements
            .iter()
            .filter(move |settlement| settlement.entry_id == entry_id)
    }

    /// Display name of an entry's supplier or customer.
    pub fn counterparty_name(&self, entry: &FinancialEntry) -> String {
        match entry.kind {
            EntryKind::Expense => name_or_unresolved(&self.suppliers, &entry.counterparty_id),
            EntryKind::Revenue => name_or_unresolved(&self.customers, &entry.counterparty_id),
        }
    }

    pub fn project_name(&self, id: &str) -> String {
        name_or_unresolved(&self.projects, id)
    }

    pub fn cash_account_name(&self, id: &str) -> String {
        name_or_unresolved(&self.cash_accounts, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_defaults_are_empty() {
        let ledger = Ledger::new();
        assert_eq!(ledger.schema_version, CURRENT_SCHEMA_VERSION);
        assert!(ledger.entries.is_empty());
        assert_eq!(ledger.counters, IdCounters::default());
    }

    #[test]
    fn missing_collections_deserialize_as_empty() {
        let json = r#"{
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "projects": [{"id": "proj-001", "name": "Residencial Alegria"}]
        }"#;
        let ledger: Ledger = serde_json::from_str(json).unwrap();
        assert_eq!(ledger.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(ledger.projects.len(), 1);
        assert!(ledger.settlements.is_empty());
        assert_eq!(ledger.project_name("proj-001"), "Residencial Alegria");
        assert_eq!(ledger.project_name("proj-404"), UNRESOLVED_LABEL);
    }
}
