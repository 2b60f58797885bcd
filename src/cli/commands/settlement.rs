use obra_core::{SettlementDraft, SettlementService};
use obra_domain::{DateRange, SettlementKind};

use crate::cli::args::ParsedArgs;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::ui::{Table, TableColumn, TableRenderer};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "settle",
            "Post a payment or receipt against an entry",
            "settle <entry-id> amount=<value|all> [date=<date>] [account=<id>] [notes=]",
            cmd_settle,
        ),
        CommandEntry::new(
            "payments",
            "List payments made",
            "payments [from=<date>] [to=<date>]",
            cmd_payments,
        ),
        CommandEntry::new(
            "receipts",
            "List receipts collected",
            "receipts [from=<date>] [to=<date>]",
            cmd_receipts,
        ),
    ]
}

fn cmd_settle(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args);
    let entry_id = parsed.positional(0, "entry id")?;
    let entry = context
        .ledger()
        .entry(entry_id)
        .ok_or_else(|| CommandError::InvalidArguments(format!("no entry with id {}", entry_id)))?;

    let amount = match parsed.require("amount")? {
        "all" | "rest" => entry.outstanding(),
        _ => parsed.amount("amount")?.unwrap_or_default(),
    };
    let draft = SettlementDraft {
        entry_id: entry.id.clone(),
        kind: entry.kind.settlement_kind(),
        amount,
        date: parsed
            .date("date")?
            .unwrap_or_else(|| context.state.clock().today()),
        cash_account_id: parsed
            .get("account")
            .map(str::to_string)
            .unwrap_or_else(|| entry.cash_account_id.clone()),
        notes: parsed.get("notes").map(str::to_string),
    };

    let settlement = context
        .state
        .mutate(|ledger, clock| SettlementService::post(ledger, draft, clock))?;
    let entry = context.ledger().entry(&settlement.entry_id);
    output::success(format!(
        "{} {} of {} posted to {}.",
        settlement.kind,
        settlement.id,
        context.money(settlement.amount),
        settlement.entry_id
    ));
    if let Some(entry) = entry {
        output::info(format!(
            "{} is now {}; outstanding {}.",
            entry.id,
            entry.status_label().to_lowercase(),
            context.money(entry.outstanding())
        ));
    }
    Ok(())
}

fn cmd_payments(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    history(context, SettlementKind::Payment, &ParsedArgs::parse(args))
}

fn cmd_receipts(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    history(context, SettlementKind::Receipt, &ParsedArgs::parse(args))
}

fn history(context: &ShellContext, kind: SettlementKind, args: &ParsedArgs) -> CommandResult {
    let range: DateRange = args.range()?;
    let ledger = context.ledger();
    let rows = SettlementService::history(ledger, kind, &range);
    let mut table = Table::new(
        Some(format!("{}s ({})", kind, range)),
        vec![
            TableColumn::new("ID"),
            TableColumn::new("Date"),
            TableColumn::new("Entry"),
            TableColumn::new("Counterparty").capped(28),
            TableColumn::new("Account").capped(24),
            TableColumn::right("Amount"),
        ],
    );
    for settlement in &rows {
        let counterparty = ledger
            .entry(&settlement.entry_id)
            .map(|entry| ledger.counterparty_name(entry))
            .unwrap_or_else(|| obra_domain::UNRESOLVED_LABEL.to_string());
        table.add_row(vec![
            settlement.id.clone(),
            context.date(settlement.date),
            settlement.entry_id.clone(),
            counterparty,
            ledger.cash_account_name(&settlement.cash_account_id),
            context.money(settlement.amount),
        ]);
    }
    TableRenderer::print(&table);
    let total = rows.iter().map(|settlement| settlement.amount).sum();
    output::info(format!("Total: {}", context.money(total)));
    Ok(())
}
