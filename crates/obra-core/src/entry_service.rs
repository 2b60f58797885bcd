//! Expense and revenue entry creation, editing and listing.

use chrono::NaiveDate;
use obra_domain::{
    DateRange, EntryKind, EntryStatus, EntryType, FinancialEntry, Ledger, LineItem,
    TransactionType, UnitOfMeasure,
};
use rust_decimal::Decimal;
use tracing::info;

use crate::ids::{IdGenerator, SequenceKind};
use crate::time::Clock;
use crate::totals;
use crate::{CoreError, CoreResult};

/// Caller-supplied line item before identifiers and amounts are derived.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemDraft {
    pub description: String,
    pub quantity: Option<Decimal>,
    pub unit: UnitOfMeasure,
    pub unit_price: Option<Decimal>,
    /// Used only when quantity or unit price is missing.
    pub amount: Option<Decimal>,
    pub target_id: String,
    pub product_id: Option<String>,
}

impl LineItemDraft {
    pub fn priced(
        description: impl Into<String>,
        quantity: Decimal,
        unit: UnitOfMeasure,
        unit_price: Decimal,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            quantity: Some(quantity),
            unit,
            unit_price: Some(unit_price),
            amount: None,
            target_id: target_id.into(),
            product_id: None,
        }
    }

    pub fn lump_sum(
        description: impl Into<String>,
        amount: Decimal,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            quantity: None,
            unit: UnitOfMeasure::Lump,
            unit_price: None,
            amount: Some(amount),
            target_id: target_id.into(),
            product_id: None,
        }
    }

    pub fn with_product(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }
}

/// Header and lines for a new or edited entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub kind: EntryKind,
    pub entry_type: EntryType,
    pub invoice_number: Option<String>,
    pub project_id: String,
    pub counterparty_id: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub cash_account_id: String,
    pub description: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub related_unit: Option<String>,
    pub line_items: Vec<LineItemDraft>,
}

impl EntryDraft {
    pub fn new(
        kind: EntryKind,
        project_id: impl Into<String>,
        counterparty_id: impl Into<String>,
        cash_account_id: impl Into<String>,
        issue_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            kind,
            entry_type: EntryType::default(),
            invoice_number: None,
            project_id: project_id.into(),
            counterparty_id: counterparty_id.into(),
            issue_date,
            due_date,
            cash_account_id: cash_account_id.into(),
            description: None,
            transaction_type: None,
            related_unit: None,
            line_items: Vec::new(),
        }
    }

    pub fn with_line(mut self, line: LineItemDraft) -> Self {
        self.line_items.push(line);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Optional criteria for the entry list views.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub kind: Option<EntryKind>,
    pub project_id: Option<String>,
    pub counterparty_id: Option<String>,
    pub status: Option<EntryStatus>,
    pub range: DateRange,
}

impl EntryFilter {
    pub fn of_kind(kind: EntryKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn matches(&self, entry: &FinancialEntry) -> bool {
        self.kind.map_or(true, |kind| entry.kind == kind)
            && self
                .project_id
                .as_deref()
                .map_or(true, |project| entry.project_id == project)
            && self
                .counterparty_id
                .as_deref()
                .map_or(true, |party| entry.counterparty_id == party)
            && self.status.map_or(true, |status| entry.status == status)
            && self.range.contains(entry.issue_date)
    }
}

pub struct EntryService;

impl EntryService {
    /// Validates and records a new entry. Nothing is written when validation fails.
    pub fn create(
        ledger: &mut Ledger,
        draft: EntryDraft,
        clock: &dyn Clock,
    ) -> CoreResult<FinancialEntry> {
        Self::validate(ledger, &draft)?;
        let id = IdGenerator::next(ledger, SequenceKind::for_entry(draft.kind), clock);
        let line_items = Self::build_lines(ledger, &draft.line_items, clock)?;
        let mut entry = FinancialEntry {
            id,
            kind: draft.kind,
            entry_type: draft.entry_type,
            invoice_number: clean(draft.invoice_number),
            project_id: draft.project_id,
            counterparty_id: draft.counterparty_id,
            issue_date: draft.issue_date,
            due_date: draft.due_date,
            cash_account_id: draft.cash_account_id,
            description: clean(draft.description),
            transaction_type: draft.transaction_type,
            related_unit: clean(draft.related_unit),
            line_items,
            total_amount: Decimal::ZERO,
            settled_amount: Decimal::ZERO,
            status: EntryStatus::Pending,
        };
        totals::recompute(&mut entry)?;
        ledger.entries.push(entry.clone());
        ledger.touch();
        info!(id = %entry.id, kind = %entry.kind, total = %entry.total_amount, "entry created");
        Ok(entry)
    }

    /// Replaces header and lines of an existing entry, keeping what was already settled.
    pub fn update(
        ledger: &mut Ledger,
        id: &str,
        draft: EntryDraft,
        clock: &dyn Clock,
    ) -> CoreResult<FinancialEntry> {
        let existing = ledger
            .entry(id)
            .ok_or_else(|| CoreError::not_found("Entry", id))?;
        if existing.kind != draft.kind {
            return Err(CoreError::InvalidOperation(format!(
                "entry {id} is an {} and cannot become a {}",
                existing.kind, draft.kind
            )));
        }
        let settled = existing.settled_amount;
        Self::validate(ledger, &draft)?;

        let new_total = totals::sum_amounts(
            draft
                .line_items
                .iter()
                .map(draft_amount)
                .collect::<CoreResult<Vec<_>>>()?,
        )?;
        if new_total < settled {
            return Err(CoreError::Validation(format!(
                "new total {new_total} is below the {settled} already settled"
            )));
        }

        let line_items = Self::build_lines(ledger, &draft.line_items, clock)?;
        let entry = ledger
            .entry_mut(id)
            .ok_or_else(|| CoreError::not_found("Entry", id))?;
        entry.entry_type = draft.entry_type;
        entry.invoice_number = clean(draft.invoice_number);
        entry.project_id = draft.project_id;
        entry.counterparty_id = draft.counterparty_id;
        entry.issue_date = draft.issue_date;
        entry.due_date = draft.due_date;
        entry.cash_account_id = draft.cash_account_id;
        entry.description = clean(draft.description);
        entry.transaction_type = draft.transaction_type;
        entry.related_unit = clean(draft.related_unit);
        entry.line_items = line_items;
        totals::recompute(entry)?;
        let updated = entry.clone();
        ledger.touch();
        info!(id, total = %updated.total_amount, "entry updated");
        Ok(updated)
    }

    /// Entries matching `filter`, most recently issued first.
    pub fn list<'a>(ledger: &'a Ledger, filter: &EntryFilter) -> Vec<&'a FinancialEntry> {
        let mut entries: Vec<&FinancialEntry> = ledger
            .entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .collect();
        entries.sort_by(|a, b| b.issue_date.cmp(&a.issue_date).then_with(|| b.id.cmp(&a.id)));
        entries
    }

    fn build_lines(
        ledger: &mut Ledger,
        drafts: &[LineItemDraft],
        clock: &dyn Clock,
    ) -> CoreResult<Vec<LineItem>> {
        drafts
            .iter()
            .map(|draft| {
                Ok(LineItem {
                    id: IdGenerator::next(ledger, SequenceKind::LineItem, clock),
                    description: draft.description.trim().to_string(),
                    quantity: draft.quantity,
                    unit: draft.unit.clone(),
                    unit_price: draft.unit_price,
                    amount: draft_amount(draft)?,
                    target_id: draft.target_id.clone(),
                    product_id: draft.product_id.clone(),
                })
            })
            .collect()
    }

    fn validate(ledger: &Ledger, draft: &EntryDraft) -> CoreResult<()> {
        if draft.line_items.is_empty() {
            return Err(CoreError::Validation(
                "an entry needs at least one line item".into(),
            ));
        }
        if ledger.project(&draft.project_id).is_none() {
            return Err(CoreError::Validation(format!(
                "unknown project {}",
                draft.project_id
            )));
        }
        let counterparty_known = match draft.kind {
            EntryKind::Expense => ledger.supplier(&draft.counterparty_id).is_some(),
            EntryKind::Revenue => ledger.customer(&draft.counterparty_id).is_some(),
        };
        if !counterparty_known {
            return Err(CoreError::Validation(format!(
                "unknown {} {}",
                draft.kind.counterparty_label(),
                draft.counterparty_id
            )));
        }
        if ledger.cash_account(&draft.cash_account_id).is_none() {
            return Err(CoreError::Validation(format!(
                "unknown cash account {}",
                draft.cash_account_id
            )));
        }
        if draft.due_date < draft.issue_date {
            return Err(CoreError::Validation(
                "due date cannot precede the issue date".into(),
            ));
        }
        for (index, line) in draft.line_items.iter().enumerate() {
            Self::validate_line(ledger, draft.kind, index + 1, line)?;
        }
        Ok(())
    }

    fn validate_line(
        ledger: &Ledger,
        kind: EntryKind,
        position: usize,
        line: &LineItemDraft,
    ) -> CoreResult<()> {
        let fail = |message: String| Err(CoreError::Validation(format!("line {position}: {message}")));
        if line.description.trim().is_empty() {
            return fail("description is required".into());
        }
        if line.quantity.is_some_and(|quantity| quantity < Decimal::ZERO) {
            return fail("quantity cannot be negative".into());
        }
        if line.unit_price.is_some_and(|price| price < Decimal::ZERO) {
            return fail("unit price cannot be negative".into());
        }
        let amount = match draft_amount(line) {
            Ok(amount) if amount <= totals::MAX_LINE_AMOUNT => amount,
            _ => return fail(format!("amount too large, the limit is {}", totals::MAX_LINE_AMOUNT)),
        };
        if amount <= Decimal::ZERO {
            return fail("amount must be greater than zero".into());
        }
        match kind {
            EntryKind::Expense => match ledger.cost_center(&line.target_id) {
                None => return fail(format!("unknown cost center {}", line.target_id)),
                Some(node) if !node.is_launchable => {
                    return fail(format!(
                        "cost center {} does not accept direct postings",
                        node.name
                    ))
                }
                Some(_) => {}
            },
            EntryKind::Revenue => {
                if ledger.revenue_category(&line.target_id).is_none() {
                    return fail(format!("unknown revenue category {}", line.target_id));
                }
            }
        }
        if let Some(product) = line.product_id.as_deref() {
            if ledger.product(product).is_none() {
                return fail(format!("unknown product {product}"));
            }
        }
        Ok(())
    }
}

fn draft_amount(line: &LineItemDraft) -> CoreResult<Decimal> {
    totals::line_amount(line.quantity, line.unit_price, line.amount)
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;
    use crate::time::FixedClock;
    use rust_decimal_macros::dec;

    fn clock() -> FixedClock {
        FixedClock::on(date(2024, 6, 1))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense_draft() -> EntryDraft {
        EntryDraft::new(
            EntryKind::Expense,
            "proj-001",
            "sup-001",
            "ca-001",
            date(2024, 6, 1),
            date(2024, 6, 30),
        )
        .with_line(LineItemDraft::priced(
            "Cimento",
            dec!(10),
            UnitOfMeasure::Custom("sc".into()),
            dec!(10),
            "cc-prod-cimento",
        ))
        .with_line(LineItemDraft::lump_sum("Frete", dec!(50), "cc-admin-equip"))
    }

    #[test]
    fn total_is_sum_of_line_amounts() {
        let mut ledger = seed::seed_ledger();
        let entry = EntryService::create(&mut ledger, expense_draft(), &clock()).unwrap();
        assert_eq!(entry.id, "EXP-2024-00001");
        assert_eq!(entry.total_amount, dec!(150));
        assert_eq!(entry.line_items[0].amount, dec!(100));
        assert_eq!(entry.status, EntryStatus::Pending);
        assert_eq!(entry.total_amount, totals::entry_total(&entry.line_items).unwrap());
    }

    #[test]
    fn rejects_empty_line_list() {
        let mut ledger = seed::seed_ledger();
        let mut draft = expense_draft();
        draft.line_items.clear();
        let err = EntryService::create(&mut ledger, draft, &clock()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(ledger.entries.is_empty());
        assert_eq!(ledger.counters.expense, 0);
    }

    #[test]
    fn oversized_amounts_are_rejected_not_panicking() {
        let mut ledger = seed::seed_ledger();
        let mut priced = expense_draft();
        priced.line_items[0].quantity = Some(Decimal::MAX);
        priced.line_items[0].unit_price = Some(dec!(2));
        let err = EntryService::create(&mut ledger, priced, &clock()).unwrap_err();
        assert!(err.to_string().contains("amount too large"));

        let doubled = EntryDraft::new(
            EntryKind::Expense,
            "proj-001",
            "sup-001",
            "ca-001",
            date(2024, 6, 1),
            date(2024, 6, 30),
        )
        .with_line(LineItemDraft::lump_sum("Frete", Decimal::MAX, "cc-admin-equip"))
        .with_line(LineItemDraft::lump_sum("Frete", Decimal::MAX, "cc-admin-equip"));
        let err = EntryService::create(&mut ledger, doubled, &clock()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let mut at_limit = expense_draft();
        at_limit.line_items[1].amount = Some(totals::MAX_LINE_AMOUNT);
        let entry = EntryService::create(&mut ledger, at_limit, &clock()).unwrap();
        assert_eq!(entry.total_amount, totals::MAX_LINE_AMOUNT + dec!(100));
        assert_eq!(ledger.entries.len(), 1);
    }

    #[test]
    fn rejects_non_launchable_cost_center() {
        let mut ledger = seed::seed_ledger();
        let mut draft = expense_draft();
        draft.line_items[0].target_id = "cc-proj".into();
        let err = EntryService::create(&mut ledger, draft, &clock()).unwrap_err();
        assert!(err.to_string().contains("does not accept direct postings"));
    }

    #[test]
    fn rejects_unknown_counterparty_for_kind() {
        let mut ledger = seed::seed_ledger();
        let mut draft = expense_draft();
        draft.counterparty_id = "cust-001".into();
        let err = EntryService::create(&mut ledger, draft, &clock()).unwrap_err();
        assert!(err.to_string().contains("unknown supplier"));
    }

    #[test]
    fn revenue_lines_target_categories() {
        let mut ledger = seed::seed_ledger();
        let draft = EntryDraft::new(
            EntryKind::Revenue,
            "proj-001",
            "cust-001",
            "ca-002",
            date(2024, 6, 1),
            date(2024, 7, 1),
        )
        .with_line(LineItemDraft::lump_sum("Apto 101", dec!(250000), "revcat-001"));
        let entry = EntryService::create(&mut ledger, draft, &clock()).unwrap();
        assert_eq!(entry.id, "REV-2024-00001");
        assert_eq!(entry.status_label(), "Unreceived");

        let mut bad = expense_draft();
        bad.kind = EntryKind::Revenue;
        bad.counterparty_id = "cust-001".into();
        assert!(EntryService::create(&mut ledger, bad, &clock()).is_err());
    }

    #[test]
    fn update_recomputes_total_and_keeps_settled() {
        let mut ledger = seed::seed_ledger();
        let entry = EntryService::create(&mut ledger, expense_draft(), &clock()).unwrap();
        ledger.entry_mut(&entry.id).unwrap().settled_amount = dec!(60);

        let mut draft = expense_draft();
        draft.line_items[1].amount = Some(dec!(20));
        let updated = EntryService::update(&mut ledger, &entry.id, draft, &clock()).unwrap();
        assert_eq!(updated.total_amount, dec!(120));
        assert_eq!(updated.settled_amount, dec!(60));
        assert_eq!(updated.status, EntryStatus::PartiallySettled);
    }

    #[test]
    fn update_cannot_drop_below_settled() {
        let mut ledger = seed::seed_ledger();
        let entry = EntryService::create(&mut ledger, expense_draft(), &clock()).unwrap();
        ledger.entry_mut(&entry.id).unwrap().settled_amount = dec!(140);

        let mut draft = expense_draft();
        draft.line_items.truncate(1);
        let err = EntryService::update(&mut ledger, &entry.id, draft, &clock()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(ledger.entry(&entry.id).unwrap().total_amount, dec!(150));
    }

    #[test]
    fn list_filters_and_orders_newest_first() {
        let mut ledger = seed::seed_ledger();
        let clock = clock();
        let first = EntryService::create(&mut ledger, expense_draft(), &clock).unwrap();
        let mut later = expense_draft();
        later.issue_date = date(2024, 6, 10);
        later.due_date = date(2024, 6, 10);
        later.project_id = "proj-002".into();
        let second = EntryService::create(&mut ledger, later, &clock).unwrap();

        let all = EntryService::list(&ledger, &EntryFilter::of_kind(EntryKind::Expense));
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);

        let filter = EntryFilter {
            project_id: Some("proj-001".into()),
            ..EntryFilter::default()
        };
        let only_first = EntryService::list(&ledger, &filter);
        assert_eq!(only_first.len(), 1);
        assert_eq!(only_first[0].id, first.id);
    }
}
