use obra_core::ReportService;

use super::{split_subcommand, unknown_subcommand};
use crate::cli::args::ParsedArgs;
use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::ui::{Table, TableColumn, TableRenderer};

const USAGE: &str = "report rollup project=<id> [from=] [to=]
report cashflow [account=<id>] [from=] [to=]
report product <product-id>
report dashboard";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("report", "Financial reports", USAGE, cmd_report)
            .with_subcommands(&["rollup", "cashflow", "product", "dashboard"]),
        CommandEntry::new(
            "dashboard",
            "Totals, open balances and the latest entries",
            "dashboard",
            cmd_dashboard,
        ),
    ]
}

fn cmd_report(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (sub, rest) = split_subcommand(args, "report <rollup|cashflow|product|dashboard>")?;
    let parsed = ParsedArgs::parse(rest);
    match sub.as_str() {
        "rollup" => rollup(context, &parsed),
        "cashflow" => cash_flow(context, &parsed),
        "product" => product(context, &parsed),
        "dashboard" => dashboard(context),
        other => Err(unknown_subcommand("report", other)),
    }
}

fn cmd_dashboard(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    dashboard(context)
}

fn rollup(context: &ShellContext, args: &ParsedArgs) -> CommandResult {
    let project = args.require("project")?;
    let report = ReportService::cost_center_rollup(context.ledger(), project, &args.range()?)?;

    let mut table = Table::new(
        Some(format!("Cost centers: {} ({})", report.project_name, report.range)),
        vec![
            TableColumn::new("Cost center"),
            TableColumn::right("Direct"),
            TableColumn::right("Total"),
        ],
    );
    for row in report.rows.iter().filter(|row| !row.total.is_zero()) {
        table.add_row(vec![
            format!("{}{}", "  ".repeat(row.depth), row.name),
            if row.direct.is_zero() {
                String::new()
            } else {
                context.money(row.direct)
            },
            context.money(row.total),
        ]);
    }
    TableRenderer::print(&table);
    output::info(format!("  Expenses    : {}", context.money(report.expense_total)));
    if !report.unallocated.is_zero() {
        output::warning(format!(
            "{} is posted to cost centers that no longer exist.",
            context.money(report.unallocated)
        ));
    }
    output::info(format!("  Revenues    : {}", context.money(report.revenue_total)));
    output::info(format!("  Net result  : {}", context.money(report.net_result)));
    Ok(())
}

fn cash_flow(context: &ShellContext, args: &ParsedArgs) -> CommandResult {
    let report =
        ReportService::cash_flow(context.ledger(), args.get("account"), &args.range()?)?;

    let mut table = Table::new(
        Some(format!("Cash flow: {} ({})", report.cash_account_name, report.range)),
        vec![
            TableColumn::new("Date"),
            TableColumn::new("Settlement"),
            TableColumn::new("Description").capped(32),
            TableColumn::new("Counterparty").capped(24),
            TableColumn::right("In"),
            TableColumn::right("Out"),
            TableColumn::right("Balance"),
        ],
    );
    for row in &report.rows {
        table.add_row(vec![
            context.date(row.date),
            row.settlement_id.clone(),
            row.description.clone(),
            row.counterparty.clone(),
            optional_money(context, row.inflow),
            optional_money(context, row.outflow),
            context.money(row.balance),
        ]);
    }
    output::info(format!("  Opening balance : {}", context.money(report.opening_balance)));
    TableRenderer::print(&table);
    output::info(format!("  Inflows         : {}", context.money(report.total_inflows)));
    output::info(format!("  Outflows        : {}", context.money(report.total_outflows)));
    output::info(format!("  Net flow        : {}", context.money(report.net_flow)));
    output::info(format!("  Closing balance : {}", context.money(report.closing_balance)));
    Ok(())
}

fn product(context: &ShellContext, args: &ParsedArgs) -> CommandResult {
    let product_id = match args.get("product") {
        Some(id) => id,
        None => args.positional(0, "product id")?,
    };
    let report = ReportService::product_purchase_history(context.ledger(), product_id)?;

    let mut table = Table::new(
        Some(format!("Purchases of {}", report.product_name)),
        vec![
            TableColumn::new("Date"),
            TableColumn::new("Entry"),
            TableColumn::new("Supplier").capped(24),
            TableColumn::new("Project").capped(24),
            TableColumn::right("Qty"),
            TableColumn::new("Unit"),
            TableColumn::right("Unit price"),
            TableColumn::right("Amount"),
        ],
    );
    for row in &report.rows {
        table.add_row(vec![
            context.date(row.date),
            row.entry_id.clone(),
            row.supplier.clone(),
            row.project.clone(),
            row.quantity.map(|qty| qty.normalize().to_string()).unwrap_or_default(),
            row.unit.to_string(),
            row.unit_price.map(|price| context.money(price)).unwrap_or_default(),
            context.money(row.amount),
        ]);
    }
    TableRenderer::print(&table);
    output::info(format!(
        "  Bought {} for {}",
        report.total_quantity.normalize(),
        context.money(report.total_amount)
    ));
    Ok(())
}

fn dashboard(context: &ShellContext) -> CommandResult {
    let summary = ReportService::dashboard(context.ledger());
    output::section("Dashboard");
    output::info(format!(
        "  Expenses    : {}  ({} open, {} to pay)",
        context.money(summary.total_expenses),
        summary.open_expenses,
        context.money(summary.payables_outstanding)
    ));
    output::info(format!(
        "  Revenues    : {}  ({} open, {} to receive)",
        context.money(summary.total_revenues),
        summary.open_revenues,
        context.money(summary.receivables_outstanding)
    ));

    let mut table = Table::new(
        Some("Latest entries"),
        vec![
            TableColumn::new("ID"),
            TableColumn::new("Issued"),
            TableColumn::new("Counterparty").capped(28),
            TableColumn::right("Total"),
            TableColumn::new("Status"),
        ],
    );
    for recent in &summary.recent {
        table.add_row(vec![
            recent.id.clone(),
            context.date(recent.issue_date),
            recent.counterparty.clone(),
            context.money(recent.total_amount),
            recent.status.to_string(),
        ]);
    }
    TableRenderer::print(&table);
    Ok(())
}

fn optional_money(context: &ShellContext, amount: obra_domain::Money) -> String {
    if amount.is_zero() {
        String::new()
    } else {
        context.money(amount)
    }
}
