//! Append-only payment and receipt events.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::common::*;
use crate::entry::EntryKind;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SettlementKind {
    Payment,
    Receipt,
}

impl SettlementKind {
    /// Letter embedded in settlement identifiers (`SET-P-…`, `SET-R-…`).
    pub fn code(self) -> char {
        match self {
            SettlementKind::Payment => 'P',
            SettlementKind::Receipt => 'R',
        }
    }

    pub fn entry_kind(self) -> EntryKind {
        match self {
            SettlementKind::Payment => EntryKind::Expense,
            SettlementKind::Receipt => EntryKind::Revenue,
        }
    }

    /// Receipts bring money in; payments take it out.
    pub fn signed(self, amount: Money) -> Money {
        match self {
            SettlementKind::Payment => -amount,
            SettlementKind::Receipt => amount,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "payment" | "pagamento" | "p" => Some(SettlementKind::Payment),
            "receipt" | "recebimento" | "r" => Some(SettlementKind::Receipt),
            _ => None,
        }
    }
}

impl fmt::Display for SettlementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SettlementKind::Payment => "Payment",
            SettlementKind::Receipt => "Receipt",
        };
        f.write_str(label)
    }
}

/// Money movement against exactly one entry. Never edited once posted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settlement {
    pub id: String,
    pub entry_id: String,
    pub kind: SettlementKind,
    pub date: NaiveDate,
    pub amount: Money,
    pub cash_account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Settlement {
    pub fn signed_amount(&self) -> Money {
        self.kind.signed(self.amount)
    }
}

impl Identifiable for Settlement {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn kinds_pair_with_entry_kinds() {
        assert_eq!(SettlementKind::Payment.entry_kind(), EntryKind::Expense);
        assert_eq!(EntryKind::Revenue.settlement_kind(), SettlementKind::Receipt);
    }

    #[test]
    fn payments_are_outflows() {
        assert_eq!(SettlementKind::Payment.signed(dec!(10)), dec!(-10));
        assert_eq!(SettlementKind::Receipt.signed(dec!(10)), dec!(10));
    }
}
