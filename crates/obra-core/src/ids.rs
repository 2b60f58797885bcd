//! Human-readable identifier generation.
//!
//! Entries, settlements, cost centers and line items draw from per-kind
//! counters persisted in the ledger. Counters are re-seeded from the highest
//! numeric suffix on load so a stale or missing counter can never reissue an
//! identifier. Reference entities receive short random tokens instead.

use std::collections::HashSet;

use chrono::Datelike;
use obra_domain::{EntryKind, Identifiable, Ledger, SettlementKind};
use uuid::Uuid;

use crate::time::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Expense,
    Revenue,
    Payment,
    Receipt,
    CostCenter,
    LineItem,
}

impl SequenceKind {
    pub const ALL: [SequenceKind; 6] = [
        SequenceKind::Expense,
        SequenceKind::Revenue,
        SequenceKind::Payment,
        SequenceKind::Receipt,
        SequenceKind::CostCenter,
        SequenceKind::LineItem,
    ];

    pub fn for_entry(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Expense => SequenceKind::Expense,
            EntryKind::Revenue => SequenceKind::Revenue,
        }
    }

    pub fn for_settlement(kind: SettlementKind) -> Self {
        match kind {
            SettlementKind::Payment => SequenceKind::Payment,
            SettlementKind::Receipt => SequenceKind::Receipt,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            SequenceKind::Expense => "EXP-",
            SequenceKind::Revenue => "REV-",
            SequenceKind::Payment => "SET-P-",
            SequenceKind::Receipt => "SET-R-",
            SequenceKind::CostCenter => "cc-user-",
            SequenceKind::LineItem => "li-",
        }
    }

    fn format(self, year: i32, seq: u32) -> String {
        match self {
            SequenceKind::CostCenter => format!("{}{:03}", self.prefix(), seq),
            SequenceKind::LineItem => format!("{}{:05}", self.prefix(), seq),
            _ => format!("{}{}-{:05}", self.prefix(), year, seq),
        }
    }

    fn counter(self, ledger: &mut Ledger) -> &mut u32 {
        let counters = &mut ledger.counters;
        match self {
            SequenceKind::Expense => &mut counters.expense,
            SequenceKind::Revenue => &mut counters.revenue,
            SequenceKind::Payment => &mut counters.payment,
            SequenceKind::Receipt => &mut counters.receipt,
            SequenceKind::CostCenter => &mut counters.cost_center,
            SequenceKind::LineItem => &mut counters.line_item,
        }
    }

    fn existing_ids(self, ledger: &Ledger) -> Vec<&str> {
        match self {
            SequenceKind::Expense | SequenceKind::Revenue => ledger
                .entries
                .iter()
                .map(|entry| entry.id())
                .collect(),
            SequenceKind::Payment | SequenceKind::Receipt => ledger
                .settlements
                .iter()
                .map(|settlement| settlement.id())
                .collect(),
            SequenceKind::CostCenter => ledger
                .cost_centers
                .iter()
                .map(|node| node.id())
                .collect(),
            SequenceKind::LineItem => ledger
                .entries
                .iter()
                .flat_map(|entry| entry.line_items.iter().map(|line| line.id()))
                .collect(),
        }
    }
}

pub struct IdGenerator;

impl IdGenerator {
    /// Issues the next identifier of `kind`, advancing the persisted counter.
    pub fn next(ledger: &mut Ledger, kind: SequenceKind, clock: &dyn Clock) -> String {
        let year = clock.today().year();
        let taken: HashSet<String> = kind
            .existing_ids(ledger)
            .into_iter()
            .map(str::to_string)
            .collect();
        let counter = kind.counter(ledger);
        loop {
            *counter = counter.saturating_add(1);
            let candidate = kind.format(year, *counter);
            if !taken.contains(&candidate) {
                return candidate;
            }
        }
    }

    /// Raises every counter to at least the highest suffix already in use.
    pub fn reseed(ledger: &mut Ledger) {
        for kind in SequenceKind::ALL {
            let highest = kind
                .existing_ids(ledger)
                .into_iter()
                .filter(|id| id.starts_with(kind.prefix()))
                .filter_map(numeric_suffix)
                .max()
                .unwrap_or(0);
            let counter = kind.counter(ledger);
            *counter = (*counter).max(highest);
        }
    }

    /// Random opaque identifier such as `sup-3f9a1c0e`, retried until unused.
    pub fn random<F>(prefix: &str, taken: F) -> String
    where
        F: Fn(&str) -> bool,
    {
        loop {
            let token = Uuid::new_v4().simple().to_string();
            let candidate = format!("{}-{}", prefix, &token[..8]);
            if !taken(&candidate) {
                return candidate;
            }
        }
    }
}

fn numeric_suffix(id: &str) -> Option<u32> {
    id.rsplit('-').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedClock;
    use chrono::NaiveDate;
    use obra_domain::CostCenter;
    use regex::Regex;

    fn clock() -> FixedClock {
        FixedClock::on(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
    }

    #[test]
    fn formats_each_sequence() {
        let mut ledger = Ledger::new();
        let clock = clock();
        assert_eq!(
            IdGenerator::next(&mut ledger, SequenceKind::Expense, &clock),
            "EXP-2024-00001"
        );
        assert_eq!(
            IdGenerator::next(&mut ledger, SequenceKind::Revenue, &clock),
            "REV-2024-00001"
        );
        assert_eq!(
            IdGenerator::next(&mut ledger, SequenceKind::Payment, &clock),
            "SET-P-2024-00001"
        );
        assert_eq!(
            IdGenerator::next(&mut ledger, SequenceKind::Receipt, &clock),
            "SET-R-2024-00001"
        );
        assert_eq!(
            IdGenerator::next(&mut ledger, SequenceKind::CostCenter, &clock),
            "cc-user-001"
        );
        assert_eq!(
            IdGenerator::next(&mut ledger, SequenceKind::Expense, &clock),
            "EXP-2024-00002"
        );
    }

    #[test]
    fn sequence_never_repeats() {
        let mut ledger = Ledger::new();
        let clock = clock();
        let ids: HashSet<String> = (0..250)
            .map(|_| IdGenerator::next(&mut ledger, SequenceKind::LineItem, &clock))
            .collect();
        assert_eq!(ids.len(), 250);
    }

    #[test]
    fn reseed_recovers_from_lost_counters() {
        let mut ledger = Ledger::new();
        ledger
            .cost_centers
            .push(CostCenter::new("cc-user-007", "Imported", None));
        ledger
            .cost_centers
            .push(CostCenter::new("cc-proj", "Seeded", None));
        assert_eq!(ledger.counters.cost_center, 0);

        IdGenerator::reseed(&mut ledger);
        assert_eq!(ledger.counters.cost_center, 7);
        assert_eq!(
            IdGenerator::next(&mut ledger, SequenceKind::CostCenter, &clock()),
            "cc-user-008"
        );
    }

    #[test]
    fn next_skips_identifiers_already_taken() {
        let mut ledger = Ledger::new();
        ledger
            .cost_centers
            .push(CostCenter::new("cc-user-001", "Manual", None));
        let id = IdGenerator::next(&mut ledger, SequenceKind::CostCenter, &clock());
        assert_eq!(id, "cc-user-002");
    }

    #[test]
    fn random_tokens_use_prefix() {
        let pattern = Regex::new(r"^sup-[0-9a-f]{8}$").unwrap();
        let id = IdGenerator::random("sup", |_| false);
        assert!(pattern.is_match(&id), "unexpected id {id}");
    }
}
