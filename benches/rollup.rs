use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use obra_finance::core::{
    seed::seed_ledger, CostCenterService, EntryDraft, EntryService, FixedClock, LineItemDraft,
    ReportService,
};
use obra_finance::domain::{DateRange, EntryKind, Ledger};
use obra_finance::storage::{load_ledger_from_path, save_ledger_to_path};
use rust_decimal::Decimal;
use tempfile::tempdir;

fn build_sample_ledger(entry_count: usize) -> Ledger {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let clock = FixedClock::on(start);
    let mut ledger = seed_ledger();
    let targets: Vec<String> = CostCenterService::launchable_nodes(&ledger)
        .into_iter()
        .map(|node| node.id)
        .collect();

    for idx in 0..entry_count {
        let issued = start + Duration::days((idx % 365) as i64);
        let mut draft = EntryDraft::new(
            EntryKind::Expense,
            "proj-001",
            "sup-001",
            "ca-001",
            issued,
            issued + Duration::days(30),
        );
        for line in 0..3 {
            let target = &targets[(idx + line) % targets.len()];
            draft = draft.with_line(LineItemDraft::lump_sum(
                "Material",
                Decimal::from(50 + (idx % 100) as i64),
                target.as_str(),
            ));
        }
        EntryService::create(&mut ledger, draft, &clock).expect("create entry");
    }
    ledger
}

fn bench_reports(c: &mut Criterion) {
    let ledger = build_sample_ledger(black_box(5_000));
    let range = DateRange::unbounded();

    c.bench_function("cost_center_rollup_5k", |b| {
        b.iter(|| {
            let report =
                ReportService::cost_center_rollup(&ledger, "proj-001", &range).expect("rollup");
            black_box(report);
        })
    });

    c.bench_function("dashboard_5k", |b| {
        b.iter(|| black_box(ReportService::dashboard(&ledger)))
    });
}

fn bench_state_io(c: &mut Criterion) {
    let ledger = build_sample_ledger(black_box(5_000));
    let dir = tempdir().expect("tempdir");
    let file_path = dir.path().join("obra_finance.json");

    c.bench_function("state_save_5k", |b| {
        b.iter_batched(
            || ledger.clone(),
            |snapshot| save_ledger_to_path(&snapshot, &file_path).expect("save state"),
            BatchSize::LargeInput,
        )
    });

    save_ledger_to_path(&ledger, &file_path).expect("seed");

    c.bench_function("state_load_5k", |b| {
        b.iter(|| black_box(load_ledger_from_path(&file_path).expect("load state")))
    });
}

criterion_group!(benches, bench_reports, bench_state_io);
criterion_main!(benches);
