//! Posting payments and receipts against entries.

use chrono::NaiveDate;
use obra_domain::{DateRange, EntryStatus, Ledger, Money, Settlement, SettlementKind};
use rust_decimal::Decimal;
use tracing::info;

use crate::ids::{IdGenerator, SequenceKind};
use crate::time::Clock;
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, PartialEq)]
pub struct SettlementDraft {
    pub entry_id: String,
    pub kind: SettlementKind,
    pub amount: Money,
    pub date: NaiveDate,
    pub cash_account_id: String,
    pub notes: Option<String>,
}

pub struct SettlementService;

impl SettlementService {
    /// Appends a settlement and advances the entry's settled amount and status together.
    pub fn post(
        ledger: &mut Ledger,
        draft: SettlementDraft,
        clock: &dyn Clock,
    ) -> CoreResult<Settlement> {
        if draft.amount <= Decimal::ZERO {
            return Err(CoreError::Validation(
                "settlement amount must be greater than zero".into(),
            ));
        }
        let entry = ledger
            .entry(&draft.entry_id)
            .ok_or_else(|| CoreError::not_found("Entry", &draft.entry_id))?;
        if entry.kind.settlement_kind() != draft.kind {
            return Err(CoreError::InvalidOperation(format!(
                "{} {} cannot take a {}",
                entry.kind,
                entry.id,
                draft.kind.to_string().to_lowercase()
            )));
        }
        let outstanding = entry.outstanding();
        if draft.amount > outstanding {
            return Err(CoreError::Validation(format!(
                "amount {} exceeds the outstanding balance {} of {}",
                draft.amount, outstanding, entry.id
            )));
        }
        if ledger.cash_account(&draft.cash_account_id).is_none() {
            return Err(CoreError::Validation(format!(
                "unknown cash account {}",
                draft.cash_account_id
            )));
        }

        let id = IdGenerator::next(ledger, SequenceKind::for_settlement(draft.kind), clock);
        let settlement = Settlement {
            id,
            entry_id: draft.entry_id,
            kind: draft.kind,
            date: draft.date,
            amount: draft.amount,
            cash_account_id: draft.cash_account_id,
            notes: draft
                .notes
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
        };
        let entry = ledger
            .entry_mut(&settlement.entry_id)
            .ok_or_else(|| CoreError::not_found("Entry", &settlement.entry_id))?;
        entry.settled_amount += settlement.amount;
        entry.status = EntryStatus::derive(entry.settled_amount, entry.total_amount);
        let status = entry.status_label();
        ledger.settlements.push(settlement.clone());
        ledger.touch();
        info!(
            id = %settlement.id,
            entry = %settlement.entry_id,
            amount = %settlement.amount,
            status,
            "settlement posted"
        );
        Ok(settlement)
    }

    /// Settlements of `kind` within `range`, newest first.
    pub fn history<'a>(
        ledger: &'a Ledger,
        kind: SettlementKind,
        range: &DateRange,
    ) -> Vec<&'a Settlement> {
        let mut rows: Vec<&Settlement> = ledger
            .settlements
            .iter()
            .filter(|settlement| settlement.kind == kind && range.contains(settlement.date))
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
        rows
    }

    /// Sum of every settlement recorded for an entry.
    pub fn settled_total(ledger: &Ledger, entry_id: &str) -> Money {
        ledger
            .settlements_for(entry_id)
            .map(|settlement| settlement.amount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry_service::{EntryDraft, EntryService, LineItemDraft};
    use crate::seed;
    use crate::time::FixedClock;
    use obra_domain::EntryKind;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn ledger_with_expense() -> (Ledger, String) {
        let mut ledger = seed::seed_ledger();
        let draft = EntryDraft::new(EntryKind::Expense, "proj-001", "sup-002", "ca-001", date(1), date(31))
            .with_line(LineItemDraft::lump_sum("Mão de obra", dec!(100), "cc-admin-mo"));
        let entry = EntryService::create(&mut ledger, draft, &FixedClock::on(date(1))).unwrap();
        (ledger, entry.id)
    }

    fn payment(entry_id: &str, amount: Money) -> SettlementDraft {
        SettlementDraft {
            entry_id: entry_id.to_string(),
            kind: SettlementKind::Payment,
            amount,
            date: date(5),
            cash_account_id: "ca-001".into(),
            notes: None,
        }
    }

    #[test]
    fn zero_and_negative_amounts_are_rejected() {
        let (mut ledger, id) = ledger_with_expense();
        let clock = FixedClock::on(date(5));
        assert!(SettlementService::post(&mut ledger, payment(&id, dec!(0)), &clock).is_err());
        assert!(SettlementService::post(&mut ledger, payment(&id, dec!(-5)), &clock).is_err());
        assert!(ledger.settlements.is_empty());
    }

    #[test]
    fn kind_must_match_entry() {
        let (mut ledger, id) = ledger_with_expense();
        let mut draft = payment(&id, dec!(10));
        draft.kind = SettlementKind::Receipt;
        let err = SettlementService::post(&mut ledger, draft, &FixedClock::on(date(5))).unwrap_err();
        assert!(matches!(err, CoreError::InvalidOperation(_)));
    }

    #[test]
    fn overpayment_is_rejected_without_side_effects() {
        let (mut ledger, id) = ledger_with_expense();
        let err = SettlementService::post(&mut ledger, payment(&id, dec!(100.01)), &FixedClock::on(date(5)))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        let entry = ledger.entry(&id).unwrap();
        assert_eq!(entry.settled_amount, dec!(0));
        assert_eq!(ledger.counters.payment, 0);
    }

    #[test]
    fn unknown_cash_account_is_rejected() {
        let (mut ledger, id) = ledger_with_expense();
        let mut draft = payment(&id, dec!(10));
        draft.cash_account_id = "ca-999".into();
        assert!(SettlementService::post(&mut ledger, draft, &FixedClock::on(date(5))).is_err());
    }

    #[test]
    fn settled_amount_matches_ledger_sum() {
        let (mut ledger, id) = ledger_with_expense();
        let clock = FixedClock::on(date(5));
        let first = SettlementService::post(&mut ledger, payment(&id, dec!(30)), &clock).unwrap();
        SettlementService::post(&mut ledger, payment(&id, dec!(70)), &clock).unwrap();
        assert_eq!(first.id, "SET-P-2024-00001");
        assert_eq!(SettlementService::settled_total(&ledger, &id), dec!(100));
        assert_eq!(ledger.entry(&id).unwrap().settled_amount, dec!(100));
        assert_eq!(ledger.entry(&id).unwrap().status_label(), "Paid");
    }

    #[test]
    fn history_is_newest_first() {
        let (mut ledger, id) = ledger_with_expense();
        let clock = FixedClock::on(date(5));
        let mut early = payment(&id, dec!(10));
        early.date = date(2);
        SettlementService::post(&mut ledger, early, &clock).unwrap();
        SettlementService::post(&mut ledger, payment(&id, dec!(10)), &clock).unwrap();
        let rows = SettlementService::history(&ledger, SettlementKind::Payment, &DateRange::unbounded());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, date(5));
        assert!(SettlementService::history(&ledger, SettlementKind::Receipt, &DateRange::unbounded())
            .is_empty());
    }
}
