//! `expense` and `revenue`: the two entry kinds share every subcommand.

use obra_core::{
    CostCenterService, EntryDraft, EntryFilter, EntryService, LineItemDraft, SettlementService,
};
use obra_domain::{
    EntryKind, EntryStatus, EntryType, FinancialEntry, LineItem, TransactionType,
    UNRESOLVED_LABEL,
};

use super::{split_subcommand, unknown_subcommand};
use crate::cli::args::{parse_item, parse_lump, ParsedArgs};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::ui::{Table, TableColumn, TableRenderer};

const SUBCOMMANDS: &[&str] = &["list", "add", "show", "edit"];

const EXPENSE_USAGE: &str = "expense list [project=] [supplier=] [status=pending|partial|paid] [from=] [to=]
expense add project=<id> supplier=<id> account=<id> [issue=<date>] [due=<date>] [invoice=] [description=] [type=financial|accounting] [transaction=product|service] item=\"desc|qty|unit|price|cost-center[|product]\" lump=\"desc|amount|cost-center\"
expense show <id>
expense edit <id> [any add option]; item=/lump= replace every line";

const REVENUE_USAGE: &str = "revenue list [project=] [customer=] [status=unreceived|partial|received] [from=] [to=]
revenue add project=<id> customer=<id> account=<id> [issue=<date>] [due=<date>] [invoice=] [description=] [unit=<sold unit>] item=\"desc|qty|unit|price|category\" lump=\"desc|amount|category\"
revenue show <id>
revenue edit <id> [any add option]; item=/lump= replace every line";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "expense",
            "Record and review supplier expenses",
            EXPENSE_USAGE,
            cmd_expense,
        )
        .with_subcommands(SUBCOMMANDS),
        CommandEntry::new(
            "revenue",
            "Record and review customer revenues",
            REVENUE_USAGE,
            cmd_revenue,
        )
        .with_subcommands(SUBCOMMANDS),
    ]
}

fn cmd_expense(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    run(context, EntryKind::Expense, args)
}

fn cmd_revenue(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    run(context, EntryKind::Revenue, args)
}

fn command_name(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Expense => "expense",
        EntryKind::Revenue => "revenue",
    }
}

fn run(context: &mut ShellContext, kind: EntryKind, args: &[&str]) -> CommandResult {
    let usage = format!("{} <list|add|show|edit>", command_name(kind));
    let (sub, rest) = split_subcommand(args, &usage)?;
    let parsed = ParsedArgs::parse(rest);
    match sub.as_str() {
        "list" => list(context, kind, &parsed),
        "add" => add(context, kind, &parsed),
        "show" => show(context, kind, &parsed),
        "edit" => edit(context, kind, &parsed),
        other => Err(unknown_subcommand(command_name(kind), other)),
    }
}

/// Shared by `list` and `export`.
pub(crate) fn filter_from_args(
    kind: EntryKind,
    args: &ParsedArgs,
) -> Result<EntryFilter, CommandError> {
    let status = args
        .get("status")
        .map(|value| {
            EntryStatus::parse(value).ok_or_else(|| {
                CommandError::InvalidArguments(format!("unknown status `{}`", value))
            })
        })
        .transpose()?;
    Ok(EntryFilter {
        kind: Some(kind),
        project_id: args.get("project").map(str::to_string),
        counterparty_id: args
            .get(kind.counterparty_label())
            .map(str::to_string),
        status,
        range: args.range()?,
    })
}

fn list(context: &ShellContext, kind: EntryKind, args: &ParsedArgs) -> CommandResult {
    let filter = filter_from_args(kind, args)?;
    let ledger = context.ledger();
    let entries = EntryService::list(ledger, &filter);
    let party_header = match kind {
        EntryKind::Expense => "Supplier",
        EntryKind::Revenue => "Customer",
    };
    let mut table = Table::new(
        Some(format!("{}s ({})", kind, filter.range)),
        vec![
            TableColumn::new("ID"),
            TableColumn::new("Issued"),
            TableColumn::new("Due"),
            TableColumn::new("Project").capped(24),
            TableColumn::new(party_header).capped(24),
            TableColumn::right("Total"),
            TableColumn::right("Outstanding"),
            TableColumn::new("Status"),
        ],
    );
    for entry in &entries {
        table.add_row(vec![
            entry.id.clone(),
            context.date(entry.issue_date),
            context.date(entry.due_date),
            ledger.project_name(&entry.project_id),
            ledger.counterparty_name(entry),
            context.money(entry.total_amount),
            context.money(entry.outstanding()),
            entry.status_label().to_string(),
        ]);
    }
    TableRenderer::print(&table);
    if !entries.is_empty() {
        let total = entries.iter().map(|entry| entry.total_amount).sum();
        let open = entries.iter().map(|entry| entry.outstanding()).sum();
        output::info(format!(
            "{} entr{}, total {}, outstanding {}",
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" },
            context.money(total),
            context.money(open)
        ));
    }
    Ok(())
}

fn add(context: &mut ShellContext, kind: EntryKind, args: &ParsedArgs) -> CommandResult {
    let draft = build_draft(context, kind, args, None)?;
    let entry = context
        .state
        .mutate(|ledger, clock| EntryService::create(ledger, draft, clock))?;
    output::success(format!(
        "{} {} recorded: {} due {}.",
        kind,
        entry.id,
        context.money(entry.total_amount),
        context.date(entry.due_date)
    ));
    Ok(())
}

fn edit(context: &mut ShellContext, kind: EntryKind, args: &ParsedArgs) -> CommandResult {
    let id = args.positional(0, "entry id")?;
    let existing = find(context, kind, id)?.clone();
    let draft = build_draft(context, kind, args, Some(&existing))?;
    let entry = context
        .state
        .mutate(|ledger, clock| EntryService::update(ledger, id, draft, clock))?;
    output::success(format!(
        "{} {} updated: {} ({}).",
        kind,
        entry.id,
        context.money(entry.total_amount),
        entry.status_label()
    ));
    Ok(())
}

fn show(context: &ShellContext, kind: EntryKind, args: &ParsedArgs) -> CommandResult {
    let id = args.positional(0, "entry id")?;
    let entry = find(context, kind, id)?;
    let ledger = context.ledger();

    output::section(format!("{} {}", kind, entry.id));
    let mut details = vec![
        ("Project", ledger.project_name(&entry.project_id)),
        (
            if kind == EntryKind::Expense { "Supplier" } else { "Customer" },
            ledger.counterparty_name(entry),
        ),
        ("Cash account", ledger.cash_account_name(&entry.cash_account_id)),
        ("Issued", context.date(entry.issue_date)),
        ("Due", context.date(entry.due_date)),
        ("Type", entry.entry_type.to_string()),
    ];
    if let Some(invoice) = &entry.invoice_number {
        details.push(("Invoice", invoice.clone()));
    }
    if let Some(description) = &entry.description {
        details.push(("Description", description.clone()));
    }
    if let Some(transaction) = entry.transaction_type {
        details.push(("Transaction", transaction.to_string()));
    }
    if let Some(unit) = &entry.related_unit {
        details.push(("Unit sold", unit.clone()));
    }
    details.push(("Total", context.money(entry.total_amount)));
    details.push(("Settled", context.money(entry.settled_amount)));
    details.push(("Outstanding", context.money(entry.outstanding())));
    details.push(("Status", entry.status_label().to_string()));
    for (label, value) in details {
        output::info(format!("  {:<13}: {}", label, value));
    }

    let mut lines = Table::new(
        Some("Line items"),
        vec![
            TableColumn::new("ID"),
            TableColumn::new("Description").capped(32),
            TableColumn::right("Qty"),
            TableColumn::new("Unit"),
            TableColumn::right("Unit price"),
            TableColumn::right("Amount"),
            TableColumn::new(match kind {
                EntryKind::Expense => "Cost center",
                EntryKind::Revenue => "Category",
            }),
        ],
    );
    for line in &entry.line_items {
        lines.add_row(vec![
            line.id.clone(),
            line.description.clone(),
            line.quantity.map(|qty| qty.normalize().to_string()).unwrap_or_default(),
            line.unit.to_string(),
            line.unit_price.map(|price| context.money(price)).unwrap_or_default(),
            context.money(line.amount),
            target_label(context, kind, line),
        ]);
    }
    TableRenderer::print(&lines);

    let history: Vec<_> = ledger.settlements_for(&entry.id).collect();
    if !history.is_empty() {
        let mut table = Table::new(
            Some("Settlements"),
            vec![
                TableColumn::new("ID"),
                TableColumn::new("Date"),
                TableColumn::new("Account"),
                TableColumn::right("Amount"),
                TableColumn::new("Notes"),
            ],
        );
        for settlement in history {
            table.add_row(vec![
                settlement.id.clone(),
                context.date(settlement.date),
                ledger.cash_account_name(&settlement.cash_account_id),
                context.money(settlement.amount),
                settlement.notes.clone().unwrap_or_default(),
            ]);
        }
        TableRenderer::print(&table);
        output::info(format!(
            "Settled so far: {}",
            context.money(SettlementService::settled_total(ledger, &entry.id))
        ));
    }
    Ok(())
}

fn target_label(context: &ShellContext, kind: EntryKind, line: &LineItem) -> String {
    let ledger = context.ledger();
    match kind {
        EntryKind::Expense => {
            let path = CostCenterService::path(ledger, Some(&line.target_id));
            if path.is_empty() {
                UNRESOLVED_LABEL.to_string()
            } else {
                path
            }
        }
        EntryKind::Revenue => ledger
            .revenue_category(&line.target_id)
            .map(|category| category.name.clone())
            .unwrap_or_else(|| UNRESOLVED_LABEL.to_string()),
    }
}

fn find<'a>(
    context: &'a ShellContext,
    kind: EntryKind,
    id: &str,
) -> Result<&'a FinancialEntry, CommandError> {
    context
        .ledger()
        .entry(id)
        .filter(|entry| entry.kind == kind)
        .ok_or_else(|| {
            CommandError::InvalidArguments(format!(
                "no {} with id {}",
                command_name(kind),
                id
            ))
        })
}

/// Assembles a draft from `key=value` options, falling back to `base` when editing.
fn build_draft(
    context: &ShellContext,
    kind: EntryKind,
    args: &ParsedArgs,
    base: Option<&FinancialEntry>,
) -> Result<EntryDraft, CommandError> {
    let party_key = kind.counterparty_label();
    let pick = |key: &str, fallback: Option<&String>| -> Result<String, CommandError> {
        match (args.get(key), fallback) {
            (Some(value), _) => Ok(value.to_string()),
            (None, Some(value)) => Ok(value.clone()),
            (None, None) => Err(CommandError::InvalidArguments(format!(
                "missing `{}=`",
                key
            ))),
        }
    };

    let project_id = pick("project", base.map(|entry| &entry.project_id))?;
    let counterparty_id = pick(party_key, base.map(|entry| &entry.counterparty_id))?;
    let cash_account_id = pick("account", base.map(|entry| &entry.cash_account_id))?;
    let issue_date = match (args.date("issue")?, base) {
        (Some(date), _) => date,
        (None, Some(entry)) => entry.issue_date,
        (None, None) => context.state.clock().today(),
    };
    let due_date = match (args.date("due")?, base) {
        (Some(date), _) => date,
        (None, Some(entry)) => entry.due_date,
        (None, None) => issue_date,
    };

    let mut draft = EntryDraft::new(
        kind,
        project_id,
        counterparty_id,
        cash_account_id,
        issue_date,
        due_date,
    );
    draft.entry_type = match args.get("type") {
        Some(value) => EntryType::parse(value).ok_or_else(|| {
            CommandError::InvalidArguments(format!("unknown entry type `{}`", value))
        })?,
        None => base.map(|entry| entry.entry_type).unwrap_or_default(),
    };
    draft.transaction_type = match args.get("transaction") {
        Some(value) => Some(TransactionType::parse(value).ok_or_else(|| {
            CommandError::InvalidArguments(format!("unknown transaction type `{}`", value))
        })?),
        None => base.and_then(|entry| entry.transaction_type),
    };
    draft.invoice_number = text_option(args, "invoice", base.and_then(|e| e.invoice_number.as_ref()));
    draft.description = text_option(args, "description", base.and_then(|e| e.description.as_ref()));
    draft.related_unit = text_option(args, "unit", base.and_then(|e| e.related_unit.as_ref()));

    let mut lines = Vec::new();
    for raw in args.all("item") {
        lines.push(parse_item(raw)?);
    }
    for raw in args.all("lump") {
        lines.push(parse_lump(raw)?);
    }
    draft.line_items = match (lines.is_empty(), base) {
        (true, Some(entry)) => entry.line_items.iter().map(line_draft).collect(),
        _ => lines,
    };
    Ok(draft)
}

fn text_option(args: &ParsedArgs, key: &str, fallback: Option<&String>) -> Option<String> {
    if args.has(key) {
        args.get(key).map(str::to_string)
    } else {
        fallback.cloned()
    }
}

fn line_draft(line: &LineItem) -> LineItemDraft {
    LineItemDraft {
        description: line.description.clone(),
        quantity: line.quantity,
        unit: line.unit.clone(),
        unit_price: line.unit_price,
        amount: Some(line.amount),
        target_id: line.target_id.clone(),
        product_id: line.product_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn filters_read_the_counterparty_key_for_the_kind() {
        let args = ParsedArgs::parse(&["supplier=sup-001", "customer=cust-001", "status=paid"]);
        let filter = filter_from_args(EntryKind::Expense, &args).unwrap();
        assert_eq!(filter.counterparty_id.as_deref(), Some("sup-001"));
        assert_eq!(filter.status, Some(EntryStatus::Settled));

        let filter = filter_from_args(EntryKind::Revenue, &args).unwrap();
        assert_eq!(filter.counterparty_id.as_deref(), Some("cust-001"));
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let args = ParsedArgs::parse(&["from=2024-05-01", "to=2024-04-01"]);
        assert!(filter_from_args(EntryKind::Expense, &args).is_err());
    }

    #[test]
    fn stored_lines_become_drafts_unchanged() {
        let line = LineItem {
            id: "li-00001".into(),
            description: "Areia".into(),
            quantity: Some(dec!(2)),
            unit: obra_domain::UnitOfMeasure::CubicMeter,
            unit_price: Some(dec!(120)),
            amount: dec!(240),
            target_id: "cc-estrutura-concreto".into(),
            product_id: Some("prod2".into()),
        };
        let draft = line_draft(&line);
        assert_eq!(draft.quantity, Some(dec!(2)));
        assert_eq!(draft.unit_price, Some(dec!(120)));
        assert_eq!(draft.product_id.as_deref(), Some("prod2"));
        assert_eq!(draft.target_id, "cc-estrutura-concreto");
    }
}
