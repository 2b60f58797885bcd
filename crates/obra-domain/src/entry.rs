//! Financial entries (expenses and revenues) and their line items.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::*;
use crate::entity::UnitOfMeasure;
use crate::settlement::SettlementKind;

/// Distinguishes money owed to suppliers from money owed by customers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Expense,
    Revenue,
}

impl EntryKind {
    /// Identifier prefix used by the sequence generator.
    pub fn id_prefix(self) -> &'static str {
        match self {
            EntryKind::Expense => "EXP",
            EntryKind::Revenue => "REV",
        }
    }

    /// Only payments settle expenses and only receipts settle revenues.
    pub fn settlement_kind(self) -> SettlementKind {
        match self {
            EntryKind::Expense => SettlementKind::Payment,
            EntryKind::Revenue => SettlementKind::Receipt,
        }
    }

    pub fn counterparty_label(self) -> &'static str {
        match self {
            EntryKind::Expense => "supplier",
            EntryKind::Revenue => "customer",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntryKind::Expense => "Expense",
            EntryKind::Revenue => "Revenue",
        };
        f.write_str(label)
    }
}

/// Bookkeeping nature of the entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum EntryType {
    Accounting,
    #[default]
    Financial,
}

impl EntryType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "accounting" | "contabil" | "contábil" => Some(EntryType::Accounting),
            "financial" | "financeiro" => Some(EntryType::Financial),
            _ => None,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntryType::Accounting => "Accounting",
            EntryType::Financial => "Financial",
        };
        f.write_str(label)
    }
}

/// Whether an expense buys goods or services.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionType {
    Product,
    Service,
}

impl TransactionType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "product" | "produto" => Some(TransactionType::Product),
            "service" | "servico" | "serviço" => Some(TransactionType::Service),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionType::Product => "Product",
            TransactionType::Service => "Service",
        };
        f.write_str(label)
    }
}

/// Settlement progress of an entry, derived from settled versus total amounts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    Pending,
    PartiallySettled,
    Settled,
}

impl EntryStatus {
    pub fn derive(settled: Decimal, total: Decimal) -> Self {
        if settled >= total {
            EntryStatus::Settled
        } else if settled > Decimal::ZERO {
            EntryStatus::PartiallySettled
        } else {
            EntryStatus::Pending
        }
    }

    /// Payment-side or receipt-side wording for the same state.
    pub fn label(self, kind: EntryKind) -> &'static str {
        match (kind, self) {
            (EntryKind::Expense, EntryStatus::Pending) => "Pending",
            (EntryKind::Expense, EntryStatus::PartiallySettled) => "Partially paid",
            (EntryKind::Expense, EntryStatus::Settled) => "Paid",
            (EntryKind::Revenue, EntryStatus::Pending) => "Unreceived",
            (EntryKind::Revenue, EntryStatus::PartiallySettled) => "Partially received",
            (EntryKind::Revenue, EntryStatus::Settled) => "Received",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" | "unreceived" => Some(EntryStatus::Pending),
            "partial" | "partially-paid" | "partially-received" => {
                Some(EntryStatus::PartiallySettled)
            }
            "settled" | "paid" | "received" => Some(EntryStatus::Settled),
            _ => None,
        }
    }

    pub fn is_open(self) -> bool {
        self != EntryStatus::Settled
    }
}

/// Single billable component of an entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItem {
    pub id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit: UnitOfMeasure,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Decimal>,
    pub amount: Money,
    /// Cost center for expense lines, revenue category for revenue lines.
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
}

impl Identifiable for LineItem {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Expense or revenue record composed of line items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FinancialEntry {
    pub id: String,
    pub kind: EntryKind,
    #[serde(default)]
    pub entry_type: EntryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    pub project_id: String,
    /// Supplier for expenses, customer for revenues.
    pub counterparty_id: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub cash_account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<TransactionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_unit: Option<String>,
    pub line_items: Vec<LineItem>,
    pub total_amount: Money,
    #[serde(default)]
    pub settled_amount: Money,
    pub status: EntryStatus,
}

impl FinancialEntry {
    pub fn outstanding(&self) -> Money {
        (self.total_amount - self.settled_amount).max(Decimal::ZERO)
    }

    pub fn status_label(&self) -> &'static str {
        self.status.label(self.kind)
    }

    pub fn references_target(&self, target_id: &str) -> bool {
        self.line_items.iter().any(|line| line.target_id == target_id)
    }
}

impl Identifiable for FinancialEntry {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Displayable for FinancialEntry {
    fn display_label(&self) -> String {
        match &self.description {
            Some(description) => format!("{} {}", self.id, description),
            None => self.id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn status_follows_settled_versus_total() {
        assert_eq!(EntryStatus::derive(dec!(0), dec!(150)), EntryStatus::Pending);
        assert_eq!(
            EntryStatus::derive(dec!(60), dec!(150)),
            EntryStatus::PartiallySettled
        );
        assert_eq!(EntryStatus::derive(dec!(150), dec!(150)), EntryStatus::Settled);
        assert_eq!(EntryStatus::derive(dec!(151), dec!(150)), EntryStatus::Settled);
    }

    #[test]
    fn labels_depend_on_entry_kind() {
        assert_eq!(
            EntryStatus::PartiallySettled.label(EntryKind::Expense),
            "Partially paid"
        );
        assert_eq!(
            EntryStatus::PartiallySettled.label(EntryKind::Revenue),
            "Partially received"
        );
        assert_eq!(EntryStatus::Pending.label(EntryKind::Revenue), "Unreceived");
    }

    #[test]
    fn parses_synonyms() {
        assert_eq!(EntryStatus::parse("paid"), Some(EntryStatus::Settled));
        assert_eq!(EntryStatus::parse("received"), Some(EntryStatus::Settled));
        assert_eq!(EntryType::parse("Contábil"), Some(EntryType::Accounting));
        assert_eq!(TransactionType::parse("serviço"), Some(TransactionType::Service));
    }
}
