use obra_core::CostCenterService;
use obra_domain::CostCenterTreeNode;

use super::{split_subcommand, unknown_subcommand};
use crate::cli::args::ParsedArgs;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::ui::{Table, TableColumn, TableRenderer};

const USAGE: &str = "costcenter list
costcenter tree
costcenter add name=<name> [parent=<id>] [launchable=yes|no]
costcenter edit <id> [name=] [launchable=yes|no]
costcenter move <id> parent=<id|root>
costcenter remove <id>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "costcenter",
        "Maintain the cost-center tree",
        USAGE,
        cmd_cost_center,
    )
    .with_subcommands(&["list", "tree", "add", "edit", "move", "remove"])]
}

fn cmd_cost_center(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (sub, rest) = split_subcommand(args, "costcenter <list|tree|add|edit|move|remove>")?;
    let parsed = ParsedArgs::parse(rest);
    match sub.as_str() {
        "list" => list(context),
        "tree" => tree(context),
        "add" => add(context, &parsed),
        "edit" => edit(context, &parsed),
        "move" => move_node(context, &parsed),
        "remove" | "delete" => remove(context, &parsed),
        other => Err(unknown_subcommand("costcenter", other)),
    }
}

fn list(context: &ShellContext) -> CommandResult {
    let mut table = Table::new(
        Some("Cost centers"),
        vec![
            TableColumn::new("ID"),
            TableColumn::new("Path"),
            TableColumn::new("Postable"),
        ],
    );
    for row in CostCenterService::flat_list(context.ledger()) {
        table.add_row(vec![row.id, row.path, yes_no(row.is_launchable).to_string()]);
    }
    TableRenderer::print(&table);
    Ok(())
}

fn tree(context: &ShellContext) -> CommandResult {
    let roots = CostCenterService::materialize_tree(context.ledger());
    output::section("Cost-center tree");
    if roots.is_empty() {
        output::info("(empty)");
    }
    for root in &roots {
        root.walk(&mut |node: &CostCenterTreeNode| output::info(tree_line(node)));
    }
    output::hint("Nodes marked with * accept postings.");
    Ok(())
}

fn tree_line(node: &CostCenterTreeNode) -> String {
    format!(
        "{}{}{} [{}]",
        "  ".repeat(node.depth),
        node.name,
        if node.is_launchable { " *" } else { "" },
        node.id
    )
}

fn add(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let name = args.require("name")?.to_string();
    let parent = args.get("parent").map(str::to_string);
    let launchable = args.flag("launchable")?;
    let node = context.state.mutate(|ledger, clock| {
        let mut node = CostCenterService::add_node(ledger, &name, parent.as_deref(), clock)?;
        if let Some(flag) = launchable.filter(|flag| *flag != node.is_launchable) {
            CostCenterService::update_node(ledger, &node.id, &node.name, flag)?;
            node.is_launchable = flag;
        }
        Ok(node)
    })?;
    output::success(format!(
        "Cost center {} created at {}.",
        node.id,
        CostCenterService::path(context.ledger(), Some(&node.id))
    ));
    Ok(())
}

fn edit(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let id = args.positional(0, "cost center id")?;
    let node = context
        .ledger()
        .cost_center(id)
        .cloned()
        .ok_or_else(|| CommandError::InvalidArguments(format!("unknown cost center {}", id)))?;
    let name = args.get("name").unwrap_or(node.name.as_str()).to_string();
    let launchable = args.flag("launchable")?.unwrap_or(node.is_launchable);
    context
        .state
        .mutate(|ledger, _| CostCenterService::update_node(ledger, id, &name, launchable))?;
    output::success(format!("Cost center {} updated.", id));
    Ok(())
}

fn move_node(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let id = args.positional(0, "cost center id")?;
    let parent = match args.require("parent")? {
        "root" | "none" => None,
        other => Some(other),
    };
    context
        .state
        .mutate(|ledger, _| CostCenterService::move_node(ledger, id, parent))?;
    output::success(format!(
        "Moved to {}.",
        CostCenterService::path(context.ledger(), Some(id))
    ));
    Ok(())
}

fn remove(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let id = args.positional(0, "cost center id")?;
    let ledger = context.ledger();
    if ledger.cost_center(id).is_none() {
        return Err(CommandError::InvalidArguments(format!(
            "unknown cost center {}",
            id
        )));
    }
    let descendants = CostCenterService::subtree_ids(ledger, id).len() - 1;
    let prompt = format!(
        "Delete {} and {} descendant(s)?",
        CostCenterService::path(ledger, Some(id)),
        descendants
    );
    if !context.confirm(&prompt)? {
        output::info("Nothing deleted.");
        return Ok(());
    }
    let removed = context
        .state
        .mutate(|ledger, _| CostCenterService::delete_node(ledger, id))?;
    output::success(format!("Removed {} cost center(s).", removed.len()));
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_lines_indent_by_depth_and_mark_postable_nodes() {
        let node = CostCenterTreeNode {
            id: "cc-prod-cimento".into(),
            name: "Cimento CPII".into(),
            path: "Custos do Projeto / Vedações e Fechamentos / Alvenaria / Cimento CPII".into(),
            depth: 3,
            is_launchable: true,
            children: Vec::new(),
        };
        assert_eq!(tree_line(&node), "      Cimento CPII * [cc-prod-cimento]");
    }
}
