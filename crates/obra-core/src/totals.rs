//! The single place where line amounts, entry totals and status are derived.
//!
//! Amounts are kept in cents: `quantity * unit_price` is rounded half away
//! from zero to two places before it is stored, and the entry total is the
//! exact sum of those stored line amounts.

use obra_domain::{EntryStatus, FinancialEntry, Ledger, LineItem, Money};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{CoreError, CoreResult};

const MONEY_SCALE: u32 = 2;

/// Largest amount a single line may carry (one trillion).
pub const MAX_LINE_AMOUNT: Money = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Rounds to cents, half away from zero.
pub fn round_money(amount: Decimal) -> Money {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

fn too_large() -> CoreError {
    CoreError::Validation("amount too large".into())
}

/// `quantity * unit_price` when both are known, otherwise the amount supplied by hand.
pub fn line_amount(
    quantity: Option<Decimal>,
    unit_price: Option<Decimal>,
    provided: Option<Decimal>,
) -> CoreResult<Money> {
    let raw = match (quantity, unit_price) {
        (Some(quantity), Some(price)) => quantity.checked_mul(price).ok_or_else(too_large)?,
        _ => provided.unwrap_or(Decimal::ZERO),
    };
    Ok(round_money(raw))
}

pub fn entry_total(lines: &[LineItem]) -> CoreResult<Money> {
    sum_amounts(lines.iter().map(|line| line.amount))
}

/// Checked sum; an overflow is reported instead of panicking.
pub fn sum_amounts(amounts: impl IntoIterator<Item = Money>) -> CoreResult<Money> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| {
            total.checked_add(amount).ok_or_else(too_large)
        })
}

/// Re-derives every line amount, the total and the status of `entry`.
pub fn recompute(entry: &mut FinancialEntry) -> CoreResult<()> {
    for line in &mut entry.line_items {
        line.amount = line_amount(line.quantity, line.unit_price, Some(line.amount))?;
    }
    entry.total_amount = entry_total(&entry.line_items)?;
    entry.status = EntryStatus::derive(entry.settled_amount, entry.total_amount);
    Ok(())
}

/// Recomputes every entry of a freshly loaded document.
pub fn recompute_all(ledger: &mut Ledger) -> CoreResult<()> {
    for entry in &mut ledger.entries {
        recompute(entry).map_err(|_| {
            CoreError::Validation(format!("entry {} has amounts too large to total", entry.id))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn quantity_times_price_wins_over_stale_amount() {
        assert_eq!(
            line_amount(Some(dec!(3)), Some(dec!(12.5)), Some(dec!(1))).unwrap(),
            dec!(37.50)
        );
    }

    #[test]
    fn lump_sum_used_without_quantity_or_price() {
        assert_eq!(line_amount(None, Some(dec!(10)), Some(dec!(80))).unwrap(), dec!(80));
        assert_eq!(line_amount(Some(dec!(2)), None, None).unwrap(), dec!(0));
    }

    #[test]
    fn rounds_fractional_cents() {
        assert_eq!(line_amount(Some(dec!(0.333)), Some(dec!(10)), None).unwrap(), dec!(3.33));
        assert_eq!(line_amount(Some(dec!(1.005)), Some(dec!(1)), None).unwrap(), dec!(1.01));
        assert_eq!(round_money(dec!(0.005)), dec!(0.01));
    }

    #[test]
    fn line_cap_is_one_trillion() {
        assert_eq!(MAX_LINE_AMOUNT, dec!(1000000000000));
    }

    #[test]
    fn overflowing_products_and_sums_are_errors() {
        let product = line_amount(Some(Decimal::MAX), Some(dec!(2)), None);
        assert!(matches!(product, Err(CoreError::Validation(_))));

        let sum = sum_amounts([Decimal::MAX, Decimal::MAX]);
        assert!(matches!(sum, Err(CoreError::Validation(_))));
    }
}
