//! Read-only reports derived from the current ledger snapshot.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use obra_domain::{
    name_or_unresolved, CostCenter, DateRange, EntryKind, FinancialEntry, Ledger, Money,
    SettlementKind, UnitOfMeasure, UNRESOLVED_LABEL,
};
use rust_decimal::Decimal;

use crate::cost_center_service::CostCenterService;
use crate::{CoreError, CoreResult};

const RECENT_ENTRY_LIMIT: usize = 5;

/// One cost-center line of the project rollup, listed in tree order.
#[derive(Debug, Clone, PartialEq)]
pub struct CostCenterRollupRow {
    pub id: String,
    pub name: String,
    pub path: String,
    pub depth: usize,
    pub is_launchable: bool,
    /// Line items posted straight to this node.
    pub direct: Money,
    /// Direct postings plus every descendant's postings.
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostCenterRollup {
    pub project_id: String,
    pub project_name: String,
    pub range: DateRange,
    pub rows: Vec<CostCenterRollupRow>,
    pub expense_total: Money,
    /// Postings whose cost center no longer exists.
    pub unallocated: Money,
    pub revenue_total: Money,
    pub net_result: Money,
}

impl CostCenterRollup {
    pub fn row(&self, id: &str) -> Option<&CostCenterRollupRow> {
        self.rows.iter().find(|row| row.id == id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CashFlowRow {
    pub date: NaiveDate,
    pub settlement_id: String,
    pub entry_id: String,
    pub kind: SettlementKind,
    pub description: String,
    pub counterparty: String,
    pub cash_account: String,
    pub inflow: Money,
    pub outflow: Money,
    pub balance: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CashFlowReport {
    pub cash_account_id: Option<String>,
    pub cash_account_name: String,
    pub range: DateRange,
    pub opening_balance: Money,
    pub rows: Vec<CashFlowRow>,
    pub total_inflows: Money,
    pub total_outflows: Money,
    pub net_flow: Money,
    pub closing_balance: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductPurchaseRow {
    pub date: NaiveDate,
    pub entry_id: String,
    pub supplier: String,
    pub project: String,
    pub description: String,
    pub quantity: Option<Decimal>,
    pub unit: UnitOfMeasure,
    pub unit_price: Option<Decimal>,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductPurchaseHistory {
    pub product_id: String,
    pub product_name: String,
    pub rows: Vec<ProductPurchaseRow>,
    pub total_quantity: Decimal,
    pub total_amount: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecentEntry {
    pub id: String,
    pub kind: EntryKind,
    pub issue_date: NaiveDate,
    pub counterparty: String,
    pub total_amount: Money,
    pub status: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub total_expenses: Money,
    pub total_revenues: Money,
    pub payables_outstanding: Money,
    pub receivables_outstanding: Money,
    pub open_expenses: usize,
    pub open_revenues: usize,
    pub recent: Vec<RecentEntry>,
}

pub struct ReportService;

impl ReportService {
    /// Per-node expense totals for one project, each node including all of its descendants.
    ///
    /// Visits every node and every line item once.
    pub fn cost_center_rollup(
        ledger: &Ledger,
        project_id: &str,
        range: &DateRange,
    ) -> CoreResult<CostCenterRollup> {
        let project = ledger
            .project(project_id)
            .ok_or_else(|| CoreError::not_found("Project", project_id))?;

        let in_scope = |entry: &&FinancialEntry| {
            entry.project_id == project_id && range.contains(entry.issue_date)
        };

        let known: HashSet<&str> = ledger
            .cost_centers
            .iter()
            .map(|node| node.id.as_str())
            .collect();
        let mut direct: HashMap<&str, Money> = HashMap::new();
        let mut unallocated = Decimal::ZERO;
        let mut expense_total = Decimal::ZERO;
        for entry in ledger.entries_of(EntryKind::Expense).filter(in_scope) {
            for line in &entry.line_items {
                expense_total += line.amount;
                if known.contains(line.target_id.as_str()) {
                    *direct.entry(line.target_id.as_str()).or_default() += line.amount;
                } else {
                    unallocated += line.amount;
                }
            }
        }
        let revenue_total: Money = ledger
            .entries_of(EntryKind::Revenue)
            .filter(in_scope)
            .map(|entry| entry.total_amount)
            .sum();

        let mut rows = Vec::with_capacity(ledger.cost_centers.len());
        let forest = CostCenterService::materialize_tree(ledger);
        for root in &forest {
            push_rollup_rows(root, &direct, &mut rows);
        }

        Ok(CostCenterRollup {
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            range: *range,
            rows,
            expense_total,
            unallocated,
            revenue_total,
            net_result: revenue_total - expense_total,
        })
    }

    /// Chronological settlements for one account (or all), with running balance.
    pub fn cash_flow(
        ledger: &Ledger,
        cash_account_id: Option<&str>,
        range: &DateRange,
    ) -> CoreResult<CashFlowReport> {
        let cash_account_name = match cash_account_id {
            Some(id) => ledger
                .cash_account(id)
                .map(|account| account.name.clone())
                .ok_or_else(|| CoreError::not_found("Cash account", id))?,
            None => "All accounts".to_string(),
        };

        let mut settlements: Vec<_> = ledger
            .settlements
            .iter()
            .filter(|settlement| {
                cash_account_id.map_or(true, |id| settlement.cash_account_id == id)
            })
            .collect();
        settlements.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

        let opening_balance: Money = settlements
            .iter()
            .filter(|settlement| range.precedes(settlement.date))
            .map(|settlement| settlement.signed_amount())
            .sum();

        let mut balance = opening_balance;
        let mut total_inflows = Decimal::ZERO;
        let mut total_outflows = Decimal::ZERO;
        let mut rows = Vec::new();
        for settlement in settlements
            .into_iter()
            .filter(|settlement| range.contains(settlement.date))
        {
            balance += settlement.signed_amount();
            let (inflow, outflow) = match settlement.kind {
                SettlementKind::Receipt => (settlement.amount, Decimal::ZERO),
                SettlementKind::Payment => (Decimal::ZERO, settlement.amount),
            };
            total_inflows += inflow;
            total_outflows += outflow;

            let entry = ledger.entry(&settlement.entry_id);
            let counterparty = entry
                .map(|entry| ledger.counterparty_name(entry))
                .unwrap_or_else(|| UNRESOLVED_LABEL.to_string());
            let description = entry
                .and_then(|entry| entry.description.clone())
                .or_else(|| settlement.notes.clone())
                .unwrap_or_else(|| {
                    let verb = match settlement.kind {
                        SettlementKind::Payment => "Payment to",
                        SettlementKind::Receipt => "Receipt from",
                    };
                    format!("{verb} {counterparty} (Ref: {})", settlement.entry_id)
                });

            rows.push(CashFlowRow {
                date: settlement.date,
                settlement_id: settlement.id.clone(),
                entry_id: settlement.entry_id.clone(),
                kind: settlement.kind,
                description,
                counterparty,
                cash_account: ledger.cash_account_name(&settlement.cash_account_id),
                inflow,
                outflow,
                balance,
            });
        }

        Ok(CashFlowReport {
            cash_account_id: cash_account_id.map(str::to_string),
            cash_account_name,
            range: *range,
            opening_balance,
            rows,
            total_inflows,
            total_outflows,
            net_flow: total_inflows - total_outflows,
            closing_balance: balance,
        })
    }

    /// Every expense line that bought `product_id`, newest first.
    pub fn product_purchase_history(
        ledger: &Ledger,
        product_id: &str,
    ) -> CoreResult<ProductPurchaseHistory> {
        let product = ledger
            .product(product_id)
            .ok_or_else(|| CoreError::not_found("Product", product_id))?;

        let mut rows: Vec<ProductPurchaseRow> = ledger
            .entries_of(EntryKind::Expense)
            .flat_map(|entry| {
                entry
                    .line_items
                    .iter()
                    .filter(move |line| line.product_id.as_deref() == Some(product_id))
                    .map(move |line| ProductPurchaseRow {
                        date: entry.issue_date,
                        entry_id: entry.id.clone(),
                        supplier: name_or_unresolved(&ledger.suppliers, &entry.counterparty_id),
                        project: ledger.project_name(&entry.project_id),
                        description: line.description.clone(),
                        quantity: line.quantity,
                        unit: line.unit.clone(),
                        unit_price: line.unit_price,
                        amount: line.amount,
                    })
            })
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.entry_id.cmp(&a.entry_id)));

        let total_quantity = rows.iter().filter_map(|row| row.quantity).sum();
        let total_amount = rows.iter().map(|row| row.amount).sum();
        Ok(ProductPurchaseHistory {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            rows,
            total_quantity,
            total_amount,
        })
    }

    pub fn dashboard(ledger: &Ledger) -> DashboardSummary {
        let mut summary = DashboardSummary {
            total_expenses: Decimal::ZERO,
            total_revenues: Decimal::ZERO,
            payables_outstanding: Decimal::ZERO,
            receivables_outstanding: Decimal::ZERO,
            open_expenses: 0,
            open_revenues: 0,
            recent: Vec::new(),
        };
        for entry in &ledger.entries {
            match entry.kind {
                EntryKind::Expense => {
                    summary.total_expenses += entry.total_amount;
                    summary.payables_outstanding += entry.outstanding();
                    if entry.status.is_open() {
                        summary.open_expenses += 1;
                    }
                }
                EntryKind::Revenue => {
                    summary.total_revenues += entry.total_amount;
                    summary.receivables_outstanding += entry.outstanding();
                    if entry.status.is_open() {
                        summary.open_revenues += 1;
                    }
                }
            }
        }

        let mut recent: Vec<&FinancialEntry> = ledger.entries.iter().collect();
        recent.sort_by(|a, b| b.issue_date.cmp(&a.issue_date).then_with(|| b.id.cmp(&a.id)));
        summary.recent = recent
            .into_iter()
            .take(RECENT_ENTRY_LIMIT)
            .map(|entry| RecentEntry {
                id: entry.id.clone(),
                kind: entry.kind,
                issue_date: entry.issue_date,
                counterparty: ledger.counterparty_name(entry),
                total_amount: entry.total_amount,
                status: entry.status_label(),
            })
            .collect();
        summary
    }
}

fn push_rollup_rows(
    node: &obra_domain::CostCenterTreeNode,
    direct: &HashMap<&str, Money>,
    rows: &mut Vec<CostCenterRollupRow>,
) -> Money {
    let index = rows.len();
    let own = direct.get(node.id.as_str()).copied().unwrap_or_default();
    rows.push(CostCenterRollupRow {
        id: node.id.clone(),
        name: node.name.clone(),
        path: node.path.clone(),
        depth: node.depth,
        is_launchable: node.is_launchable,
        direct: own,
        total: own,
    });
    let children: Money = node
        .children
        .iter()
        .map(|child| push_rollup_rows(child, direct, rows))
        .sum();
    rows[index].total = own + children;
    rows[index].total
}

/// Nodes that would be unreachable from any root (only possible with corrupt data).
pub fn unreachable_cost_centers(ledger: &Ledger) -> Vec<&CostCenter> {
    let mut reachable = HashSet::new();
    for root in CostCenterService::materialize_tree(ledger) {
        root.walk(&mut |node| {
            reachable.insert(node.id.clone());
        });
    }
    ledger
        .cost_centers
        .iter()
        .filter(|node| !reachable.contains(&node.id))
        .collect()
}
