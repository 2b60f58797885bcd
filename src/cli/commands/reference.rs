//! `project`, `supplier`, `customer`, `account`, `category` and `product`.
//!
//! All six share one list/add/edit/remove flow; each entity only describes its
//! fields and table layout.

use obra_core::{EntityService, ReferenceEntity};
use obra_domain::{
    CashAccount, Customer, Identifiable, NamedEntity, Product, Project, RevenueCategory,
    Supplier, UnitOfMeasure,
};

use super::{split_subcommand, unknown_subcommand};
use crate::cli::args::ParsedArgs;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::ui::{Table, TableColumn, TableRenderer};

const SUBCOMMANDS: &[&str] = &["list", "add", "edit", "remove"];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "project",
            "Manage construction projects",
            "project list\nproject add name=<name> [description=] [address=] [start=<date>]\nproject edit <id> [name=] [description=] [address=] [start=]\nproject remove <id>",
            cmd_project,
        )
        .with_subcommands(SUBCOMMANDS),
        CommandEntry::new(
            "supplier",
            "Manage suppliers",
            "supplier list\nsupplier add name=<name> [contact=] [email=]\nsupplier edit <id> [name=] [contact=] [email=]\nsupplier remove <id>",
            cmd_supplier,
        )
        .with_subcommands(SUBCOMMANDS),
        CommandEntry::new(
            "customer",
            "Manage customers",
            "customer list\ncustomer add name=<name> [contact=] [email=]\ncustomer edit <id> [name=] [contact=] [email=]\ncustomer remove <id>",
            cmd_customer,
        )
        .with_subcommands(SUBCOMMANDS),
        CommandEntry::new(
            "account",
            "Manage cash accounts",
            "account list\naccount add name=<name> [bank=] [agency=] [number=]\naccount edit <id> [name=] [bank=] [agency=] [number=]\naccount remove <id>",
            cmd_account,
        )
        .with_subcommands(SUBCOMMANDS),
        CommandEntry::new(
            "category",
            "Manage revenue categories",
            "category list\ncategory add name=<name>\ncategory edit <id> name=<name>\ncategory remove <id>",
            cmd_category,
        )
        .with_subcommands(SUBCOMMANDS),
        CommandEntry::new(
            "product",
            "Manage purchasable products",
            "product list\nproduct add name=<name> [unit=<m2|m3|kg|un|hr|vb|custom>]\nproduct edit <id> [name=] [unit=]\nproduct remove <id>",
            cmd_product,
        )
        .with_subcommands(SUBCOMMANDS),
    ]
}

/// Shell-side description of a reference entity.
trait ReferenceCommand: ReferenceEntity {
    const COMMAND: &'static str;

    fn columns() -> Vec<TableColumn>;
    fn row(&self, context: &ShellContext) -> Vec<String>;
    /// Builds a record from `add` arguments; the identifier is assigned on insert.
    fn draft(name: String, args: &ParsedArgs) -> Result<Self, CommandError>;
    /// Applies the `key=value` pairs given to `edit`, `name=` included.
    fn apply(&mut self, args: &ParsedArgs) -> Result<(), CommandError>;
}

fn cmd_project(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    run::<Project>(context, args)
}

fn cmd_supplier(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    run::<Supplier>(context, args)
}

fn cmd_customer(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    run::<Customer>(context, args)
}

fn cmd_account(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    run::<CashAccount>(context, args)
}

fn cmd_category(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    run::<RevenueCategory>(context, args)
}

fn cmd_product(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    run::<Product>(context, args)
}

fn run<T: ReferenceCommand>(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = format!("{} <list|add|edit|remove>", T::COMMAND);
    let (sub, rest) = split_subcommand(args, &usage)?;
    let parsed = ParsedArgs::parse(rest);
    match sub.as_str() {
        "list" => list::<T>(context),
        "add" => add::<T>(context, &parsed),
        "edit" => edit::<T>(context, &parsed),
        "remove" | "delete" => remove::<T>(context, &parsed),
        other => Err(unknown_subcommand(T::COMMAND, other)),
    }
}

fn list<T: ReferenceCommand>(context: &ShellContext) -> CommandResult {
    let mut table = Table::new(Some(format!("{}s", T::KIND)), T::columns());
    for item in EntityService::list::<T>(context.ledger()) {
        table.add_row(item.row(context));
    }
    TableRenderer::print(&table);
    Ok(())
}

fn add<T: ReferenceCommand>(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let name = match args.get("name") {
        Some(name) => name.to_string(),
        None => args.positional.join(" "),
    };
    let draft = T::draft(name, args)?;
    let created = context
        .state
        .mutate(|ledger, _| EntityService::add(ledger, draft))?;
    output::success(format!(
        "{} `{}` created with id {}.",
        T::KIND,
        created.name(),
        created.id()
    ));
    Ok(())
}

fn edit<T: ReferenceCommand>(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let id = args.positional(0, "identifier")?;
    let Some(mut entity) = T::collection(context.ledger())
        .iter()
        .find(|item| item.id() == id)
        .cloned()
    else {
        output::warning(format!("No {} with id {}.", T::KIND.to_lowercase(), id));
        return Ok(());
    };
    entity.apply(args)?;
    context
        .state
        .mutate(|ledger, _| EntityService::update(ledger, entity))?;
    output::success(format!("{} {} updated.", T::KIND, id));
    Ok(())
}

fn remove<T: ReferenceCommand>(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let id = args.positional(0, "identifier")?.to_string();
    if !context.confirm(&format!("Delete {} {}?", T::KIND.to_lowercase(), id))? {
        output::info("Nothing deleted.");
        return Ok(());
    }
    let removed = context
        .state
        .mutate(|ledger, _| EntityService::delete::<T>(ledger, &id))?;
    if removed {
        output::success(format!("{} {} deleted.", T::KIND, id));
    } else {
        output::warning(format!("No {} with id {}.", T::KIND.to_lowercase(), id));
    }
    Ok(())
}

fn rename(args: &ParsedArgs, name: &mut String) {
    if let Some(value) = args.get("name") {
        *name = value.to_string();
    }
}

/// `key=` present with an empty value clears the field.
fn optional(args: &ParsedArgs, key: &str, field: &mut Option<String>) {
    if args.has(key) {
        *field = args.get(key).map(str::to_string);
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

impl ReferenceCommand for Project {
    const COMMAND: &'static str = "project";

    fn columns() -> Vec<TableColumn> {
        vec![
            TableColumn::new("ID"),
            TableColumn::new("Name"),
            TableColumn::new("Description").capped(40),
            TableColumn::new("Start"),
        ]
    }

    fn row(&self, context: &ShellContext) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            text(&self.description),
            self.start_date.map(|date| context.date(date)).unwrap_or_default(),
        ]
    }

    fn draft(name: String, args: &ParsedArgs) -> Result<Self, CommandError> {
        let mut project = Project::new(String::new(), name);
        project.apply(args)?;
        Ok(project)
    }

    fn apply(&mut self, args: &ParsedArgs) -> Result<(), CommandError> {
        rename(args, &mut self.name);
        optional(args, "description", &mut self.description);
        optional(args, "address", &mut self.address);
        if args.has("start") {
            self.start_date = args.date("start")?;
        }
        Ok(())
    }
}

impl ReferenceCommand for Supplier {
    const COMMAND: &'static str = "supplier";

    fn columns() -> Vec<TableColumn> {
        vec![
            TableColumn::new("ID"),
            TableColumn::new("Name"),
            TableColumn::new("Contact"),
            TableColumn::new("Email"),
        ]
    }

    fn row(&self, _context: &ShellContext) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            text(&self.contact),
            text(&self.email),
        ]
    }

    fn draft(name: String, args: &ParsedArgs) -> Result<Self, CommandError> {
        let mut supplier = Supplier::new(String::new(), name);
        supplier.apply(args)?;
        Ok(supplier)
    }

    fn apply(&mut self, args: &ParsedArgs) -> Result<(), CommandError> {
        rename(args, &mut self.name);
        optional(args, "contact", &mut self.contact);
        optional(args, "email", &mut self.email);
        Ok(())
    }
}

impl ReferenceCommand for Customer {
    const COMMAND: &'static str = "customer";

    fn columns() -> Vec<TableColumn> {
        vec![
            TableColumn::new("ID"),
            TableColumn::new("Name"),
            TableColumn::new("Contact"),
            TableColumn::new("Email"),
        ]
    }

    fn row(&self, _context: &ShellContext) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            text(&self.contact),
            text(&self.email),
        ]
    }

    fn draft(name: String, args: &ParsedArgs) -> Result<Self, CommandError> {
        let mut customer = Customer::new(String::new(), name);
        customer.apply(args)?;
        Ok(customer)
    }

    fn apply(&mut self, args: &ParsedArgs) -> Result<(), CommandError> {
        rename(args, &mut self.name);
        optional(args, "contact", &mut self.contact);
        optional(args, "email", &mut self.email);
        Ok(())
    }
}

impl ReferenceCommand for CashAccount {
    const COMMAND: &'static str = "account";

    fn columns() -> Vec<TableColumn> {
        vec![
            TableColumn::new("ID"),
            TableColumn::new("Name"),
            TableColumn::new("Bank"),
            TableColumn::new("Agency"),
            TableColumn::new("Number"),
        ]
    }

    fn row(&self, _context: &ShellContext) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            text(&self.bank),
            text(&self.agency),
            text(&self.account_number),
        ]
    }

    fn draft(name: String, args: &ParsedArgs) -> Result<Self, CommandError> {
        let mut account = CashAccount::new(String::new(), name);
        account.apply(args)?;
        Ok(account)
    }

    fn apply(&mut self, args: &ParsedArgs) -> Result<(), CommandError> {
        rename(args, &mut self.name);
        optional(args, "bank", &mut self.bank);
        optional(args, "agency", &mut self.agency);
        optional(args, "number", &mut self.account_number);
        Ok(())
    }
}

impl ReferenceCommand for RevenueCategory {
    const COMMAND: &'static str = "category";

    fn columns() -> Vec<TableColumn> {
        vec![TableColumn::new("ID"), TableColumn::new("Name")]
    }

    fn row(&self, _context: &ShellContext) -> Vec<String> {
        vec![self.id.clone(), self.name.clone()]
    }

    fn draft(name: String, args: &ParsedArgs) -> Result<Self, CommandError> {
        let mut category = RevenueCategory::new(String::new(), name);
        category.apply(args)?;
        Ok(category)
    }

    fn apply(&mut self, args: &ParsedArgs) -> Result<(), CommandError> {
        rename(args, &mut self.name);
        Ok(())
    }
}

impl ReferenceCommand for Product {
    const COMMAND: &'static str = "product";

    fn columns() -> Vec<TableColumn> {
        vec![
            TableColumn::new("ID"),
            TableColumn::new("Name"),
            TableColumn::new("Unit"),
        ]
    }

    fn row(&self, _context: &ShellContext) -> Vec<String> {
        vec![self.id.clone(), self.name.clone(), self.unit.to_string()]
    }

    fn draft(name: String, args: &ParsedArgs) -> Result<Self, CommandError> {
        let mut product = Product::new(String::new(), name, UnitOfMeasure::default());
        product.apply(args)?;
        Ok(product)
    }

    fn apply(&mut self, args: &ParsedArgs) -> Result<(), CommandError> {
        rename(args, &mut self.name);
        if let Some(unit) = args.get("unit") {
            self.unit = UnitOfMeasure::parse(unit);
        }
        Ok(())
    }
}
