use std::{fs, path::PathBuf};

use obra_core::{csv, EntryService, ReportService, SettlementService};
use obra_domain::{EntryKind, SettlementKind};
use tracing::info;

use super::entry::filter_from_args;
use super::split_subcommand;
use crate::cli::args::ParsedArgs;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;

const TARGETS: &[&str] = &[
    "expenses", "revenues", "payments", "receipts", "rollup", "cashflow", "product",
];

const USAGE: &str = "export expenses [path=<file>] [project=] [supplier=] [status=] [from=] [to=]
export revenues [path=<file>] [project=] [customer=] [status=] [from=] [to=]
export payments|receipts [path=<file>] [from=] [to=]
export rollup project=<id> [path=<file>] [from=] [to=]
export cashflow [account=<id>] [path=<file>] [from=] [to=]
export product <product-id> [path=<file>]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "export",
        "Write a listing or report as CSV",
        USAGE,
        cmd_export,
    )
    .with_subcommands(TARGETS)]
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (target, rest) = split_subcommand(args, "export <target> [path=<file>]")?;
    let parsed = ParsedArgs::parse(rest);
    let document = render(context, &target, &parsed)?;
    let path = match parsed.get("path") {
        Some(path) => PathBuf::from(path),
        None => default_path(context, &target),
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, document.as_bytes())?;
    info!(target = %target, path = %path.display(), "csv exported");
    output::success(format!("Exported {} to {}.", target, path.display()));
    Ok(())
}

/// Builds the CSV text for `target` from the current state.
pub(crate) fn render(
    context: &ShellContext,
    target: &str,
    args: &ParsedArgs,
) -> Result<String, CommandError> {
    let ledger = context.ledger();
    let document = match target {
        "expenses" | "revenues" => {
            let kind = if target == "expenses" {
                EntryKind::Expense
            } else {
                EntryKind::Revenue
            };
            let filter = filter_from_args(kind, args)?;
            csv::entries(ledger, &EntryService::list(ledger, &filter))
        }
        "payments" | "receipts" => {
            let kind = if target == "payments" {
                SettlementKind::Payment
            } else {
                SettlementKind::Receipt
            };
            csv::settlements(ledger, &SettlementService::history(ledger, kind, &args.range()?))
        }
        "rollup" => csv::rollup(&ReportService::cost_center_rollup(
            ledger,
            args.require("project")?,
            &args.range()?,
        )?),
        "cashflow" => csv::cash_flow(&ReportService::cash_flow(
            ledger,
            args.get("account"),
            &args.range()?,
        )?),
        "product" => {
            let product_id = match args.get("product") {
                Some(id) => id,
                None => args.positional(0, "product id")?,
            };
            csv::product_history(&ReportService::product_purchase_history(ledger, product_id)?)
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "cannot export `{}`; choose one of {}",
                other,
                TARGETS.join(", ")
            )))
        }
    };
    Ok(document)
}

fn default_path(context: &ShellContext, target: &str) -> PathBuf {
    let today = context.state.clock().today();
    context
        .home
        .join("exports")
        .join(format!("{}_{}.csv", target, today.format("%Y%m%d")))
}
