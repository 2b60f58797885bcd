mod common;

use assert_cmd::Command;
use predicates::str::contains;
use regex::Regex;

fn script(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("obra_finance_cli").unwrap();
    cmd.env("OBRA_FINANCE_CLI_SCRIPT", "1")
        .env("OBRA_FINANCE_HOME", home)
        .env("OBRA_FINANCE_TODAY", "2024-03-01")
        .env_remove("RUST_LOG");
    cmd
}

const RECORD_EXPENSE: &str = "expense add project=proj-001 supplier=sup-001 account=ca-001 issue=2024-03-01 due=2024-03-31 \"item=Cimento CPII|10|sc|15|cc-prod-cimento|prod1\"\n";

#[test]
fn script_mode_records_settles_and_exports() {
    let home = common::test_home();
    let export = home.join("out").join("expenses.csv");
    let input = format!(
        "{RECORD_EXPENSE}settle EXP-2024-00001 amount=60 date=2024-03-10\nsettle EXP-2024-00001 amount=all date=2024-03-20\nexport expenses path={}\nexit\n",
        export.display()
    );

    script(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Expense EXP-2024-00001 recorded: R$ 150,00 due 31/03/2024."))
        .stdout(contains("EXP-2024-00001 is now partially paid; outstanding R$ 90,00."))
        .stdout(contains("EXP-2024-00001 is now paid; outstanding R$ 0,00."));

    let csv = std::fs::read_to_string(&export).expect("export written");
    assert!(csv.starts_with('\u{feff}'));
    let row = csv.lines().nth(1).expect("one data row");
    assert!(row.starts_with("EXP-2024-00001,Expense,Financial,"));
    assert!(row.ends_with(",150.00,150.00,0.00,Paid"));

    let state = std::fs::read_to_string(home.join("data").join("obra_finance.json"))
        .expect("state persisted");
    let settlement_id = Regex::new(r#""id": "SET-P-2024-\d{5}""#).unwrap();
    assert_eq!(settlement_id.find_iter(&state).count(), 2);
}

#[test]
fn overpayment_is_reported_and_nothing_changes() {
    let home = common::test_home();
    let input = format!("{RECORD_EXPENSE}settle EXP-2024-00001 amount=150.01\npayments\n");

    script(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stderr(contains("exceeds the outstanding balance"))
        .stdout(contains("Total: R$ 0,00"));
}

#[test]
fn unknown_commands_get_a_suggestion() {
    let home = common::test_home();
    script(&home)
        .write_stdin("expens list\n")
        .assert()
        .success()
        .stderr(contains("Unknown command `expens`"))
        .stdout(contains("Suggestion: `expense`?"));
}

#[test]
fn referenced_suppliers_cannot_be_removed() {
    let home = common::test_home();
    let input = format!("{RECORD_EXPENSE}supplier remove sup-001\nsupplier list\n");
    script(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stderr(contains("Still referenced"))
        .stdout(contains("sup-001"));
}

#[test]
fn config_changes_persist_between_runs() {
    let home = common::test_home();
    script(&home)
        .write_stdin("config set currency usd\n")
        .assert()
        .success();
    script(&home)
        .write_stdin("config show\n")
        .assert()
        .success()
        .stdout(contains("USD"));
}
