use chrono::NaiveDate;
use obra_finance::{
    core::{
        csv, seed::seed_ledger, EntryDraft, EntryService, FixedClock, LineItemDraft,
        ReportService, SettlementDraft, SettlementService,
    },
    domain::{DateRange, EntryKind, Ledger, SettlementKind},
};
use rust_decimal_macros::dec;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn ledger_with_activity() -> Ledger {
    let clock = FixedClock::on(day(1));
    let mut ledger = seed_ledger();
    let expense = EntryDraft::new(EntryKind::Expense, "proj-001", "sup-001", "ca-001", day(1), day(31))
        .with_description("Cimento, lote 1")
        .with_line(LineItemDraft::lump_sum("Cimento", dec!(150), "cc-prod-cimento"));
    EntryService::create(&mut ledger, expense, &clock).unwrap();
    let revenue = EntryDraft::new(EntryKind::Revenue, "proj-001", "cust-001", "ca-001", day(1), day(15))
        .with_line(LineItemDraft::lump_sum("Venda unidade 101", dec!(500), "revcat-001"));
    EntryService::create(&mut ledger, revenue, &clock).unwrap();

    for (entry_id, kind, amount, date, notes) in [
        ("REV-2024-00001", SettlementKind::Receipt, dec!(200), day(5), None),
        ("EXP-2024-00001", SettlementKind::Payment, dec!(60), day(10), Some("parcela 1")),
    ] {
        SettlementService::post(
            &mut ledger,
            SettlementDraft {
                entry_id: entry_id.into(),
                kind,
                amount,
                date,
                cash_account_id: "ca-001".into(),
                notes: notes.map(str::to_string),
            },
            &clock,
        )
        .unwrap();
    }
    ledger
}

fn without_bom(document: String) -> String {
    document.trim_start_matches(csv::BOM).to_string()
}

#[test]
fn payments_export() {
    let ledger = ledger_with_activity();
    let rows = SettlementService::history(&ledger, SettlementKind::Payment, &DateRange::unbounded());
    insta::assert_snapshot!(without_bom(csv::settlements(&ledger, &rows)), @r#"
"ID","Kind","Date","Entry","Counterparty","Cash account","Amount","Notes"
SET-P-2024-00001,Payment,2024-03-10,EXP-2024-00001,Material Forte Ltda.,Banco Alfa - C/C 010203-4,60.00,parcela 1
"#);
}

#[test]
fn cash_flow_export() {
    let ledger = ledger_with_activity();
    let report = ReportService::cash_flow(&ledger, None, &DateRange::unbounded()).unwrap();
    insta::assert_snapshot!(without_bom(csv::cash_flow(&report)), @r#"
"Date","Settlement","Entry","Description","Cash account","Inflow","Outflow","Balance"
2024-03-05,SET-R-2024-00001,REV-2024-00001,Receipt from Invest Imóveis Ltda. (Ref: REV-2024-00001),Banco Alfa - C/C 010203-4,200.00,0.00,200.00
2024-03-10,SET-P-2024-00001,EXP-2024-00001,"Cimento, lote 1",Banco Alfa - C/C 010203-4,0.00,60.00,140.00
"#);
}

#[test]
fn documents_start_with_a_byte_order_mark() {
    let ledger = ledger_with_activity();
    let rows = EntryService::list(&ledger, &obra_finance::core::EntryFilter::of_kind(EntryKind::Expense));
    let document = csv::entries(&ledger, &rows);
    assert!(document.starts_with(csv::BOM));
    assert_eq!(document.lines().count(), 2);
}
