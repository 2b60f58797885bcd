//! CSV rendering for list and report views.
//!
//! Output is UTF-8 with a byte-order mark, header labels always quoted, and
//! rows joined by `\n`. Values containing a comma, quote or line break are
//! quoted with internal quotes doubled.

use std::borrow::Cow;

use obra_domain::{FinancialEntry, Ledger, Money, Settlement};
use rust_decimal::Decimal;

use crate::report_service::{CashFlowReport, CostCenterRollup, ProductPurchaseHistory};

pub const BOM: &str = "\u{FEFF}";

/// Quotes `value` only when it contains a delimiter, quote or line break.
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(quote(value))
    } else {
        Cow::Borrowed(value)
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Renders a complete document: BOM, quoted header row, then one line per record.
pub fn render(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        headers
            .iter()
            .map(|header| quote(header))
            .collect::<Vec<_>>()
            .join(","),
    );
    for row in rows {
        lines.push(
            row.iter()
                .map(|cell| escape_field(cell))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    format!("{BOM}{}", lines.join("\n"))
}

fn money(amount: Money) -> String {
    format!("{:.2}", amount)
}

fn optional(value: Option<Decimal>) -> String {
    value.map(|amount| amount.normalize().to_string()).unwrap_or_default()
}

pub fn entries(ledger: &Ledger, entries: &[&FinancialEntry]) -> String {
    let headers = [
        "ID",
        "Kind",
        "Type",
        "Invoice",
        "Project",
        "Counterparty",
        "Issue date",
        "Due date",
        "Cash account",
        "Description",
        "Total",
        "Settled",
        "Outstanding",
        "Status",
    ];
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|entry| {
            vec![
                entry.id.clone(),
                entry.kind.to_string(),
                entry.entry_type.to_string(),
                entry.invoice_number.clone().unwrap_or_default(),
                ledger.project_name(&entry.project_id),
                ledger.counterparty_name(entry),
                entry.issue_date.to_string(),
                entry.due_date.to_string(),
                ledger.cash_account_name(&entry.cash_account_id),
                entry.description.clone().unwrap_or_default(),
                money(entry.total_amount),
                money(entry.settled_amount),
                money(entry.outstanding()),
                entry.status_label().to_string(),
            ]
        })
        .collect();
    render(&headers, &rows)
}

pub fn settlements(ledger: &Ledger, settlements: &[&Settlement]) -> String {
    let headers = [
        "ID",
        "Kind",
        "Date",
        "Entry",
        "Counterparty",
        "Cash account",
        "Amount",
        "Notes",
    ];
    let rows: Vec<Vec<String>> = settlements
        .iter()
        .map(|settlement| {
            let counterparty = ledger
                .entry(&settlement.entry_id)
                .map(|entry| ledger.counterparty_name(entry))
                .unwrap_or_else(|| obra_domain::UNRESOLVED_LABEL.to_string());
            vec![
                settlement.id.clone(),
                settlement.kind.to_string(),
                settlement.date.to_string(),
                settlement.entry_id.clone(),
                counterparty,
                ledger.cash_account_name(&settlement.cash_account_id),
                money(settlement.amount),
                settlement.notes.clone().unwrap_or_default(),
            ]
        })
        .collect();
    render(&headers, &rows)
}

pub fn rollup(report: &CostCenterRollup) -> String {
    let headers = ["Cost center", "Path", "Launchable", "Direct", "Total"];
    let rows: Vec<Vec<String>> = report
        .rows
        .iter()
        .map(|row| {
            vec![
                row.name.clone(),
                row.path.clone(),
                if row.is_launchable { "yes" } else { "no" }.to_string(),
                money(row.direct),
                money(row.total),
            ]
        })
        .collect();
    render(&headers, &rows)
}

pub fn cash_flow(report: &CashFlowReport) -> String {
    let headers = [
        "Date",
        "Settlement",
        "Entry",
        "Description",
        "Cash account",
        "Inflow",
        "Outflow",
        "Balance",
    ];
    let rows: Vec<Vec<String>> = report
        .rows
        .iter()
        .map(|row| {
            vec![
                row.date.to_string(),
                row.settlement_id.clone(),
                row.entry_id.clone(),
                row.description.clone(),
                row.cash_account.clone(),
                money(row.inflow),
                money(row.outflow),
                money(row.balance),
            ]
        })
        .collect();
    render(&headers, &rows)
}

pub fn product_history(report: &ProductPurchaseHistory) -> String {
    let headers = [
        "Date",
        "Entry",
        "Supplier",
        "Project",
        "Description",
        "Quantity",
        "Unit",
        "Unit price",
        "Amount",
    ];
    let rows: Vec<Vec<String>> = report
        .rows
        .iter()
        .map(|row| {
            vec![
                row.date.to_string(),
                row.entry_id.clone(),
                row.supplier.clone(),
                row.project.clone(),
                row.description.clone(),
                optional(row.quantity),
                row.unit.to_string(),
                optional(row.unit_price),
                money(row.amount),
            ]
        })
        .collect();
    render(&headers, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_values_stay_unquoted() {
        assert_eq!(escape_field("Cimento"), "Cimento");
    }

    #[test]
    fn special_characters_force_quoting() {
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn document_has_bom_and_quoted_headers() {
        let doc = render(&["Name", "Amount"], &[vec!["Areia, média".into(), "10.00".into()]]);
        assert!(doc.starts_with(BOM));
        let body = doc.trim_start_matches(BOM);
        let lines: Vec<_> = body.split('\n').collect();
        assert_eq!(lines[0], "\"Name\",\"Amount\"");
        assert_eq!(lines[1], "\"Areia, média\",10.00");
    }

    #[test]
    fn empty_report_is_header_only() {
        let doc = render(&["A"], &[]);
        assert_eq!(doc, format!("{BOM}\"A\""));
    }
}
