use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use vanswitch::relay::store;
use vanswitch::{RelayButton, StatusMap};

fn status_map(relays: usize) -> StatusMap {
    (0..relays)
        .map(|i| (format!("relay_{}", i), serde_json::json!(i % 2)))
        .collect()
}

fn seeded_buttons(boards: usize, relays: usize) -> Vec<RelayButton> {
    let mut buttons = Vec::new();
    let statuses = status_map(relays);
    for board in 0..boards {
        store::reconcile(&mut buttons, &format!("192.168.10.{}", 11 + board), &statuses);
    }
    buttons
}

/// Benchmark the reconcile hot path, which runs once per board per poll tick.
fn bench_reconcile(c: &mut Criterion) {
    for relays in [4, 16, 64].iter() {
        let statuses = status_map(*relays);
        let buttons = seeded_buttons(4, *relays);

        c.bench_with_input(
            BenchmarkId::new("reconcile_existing", relays),
            relays,
            |b, _| {
                b.iter(|| {
                    let mut buttons = buttons.clone();
                    store::reconcile(&mut buttons, "192.168.10.12", &statuses);
                    buttons
                })
            },
        );

        c.bench_with_input(
            BenchmarkId::new("reconcile_from_empty", relays),
            relays,
            |b, _| {
                b.iter(|| {
                    let mut buttons = Vec::new();
                    store::reconcile(&mut buttons, "192.168.10.12", &statuses);
                    buttons
                })
            },
        );
    }
}

/// Benchmark serialization of the persisted button document.
fn bench_button_serialization(c: &mut Criterion) {
    let buttons = seeded_buttons(4, 16);
    let json = serde_json::to_string(&buttons).expect("Should serialize");

    c.bench_function("buttons_json_serialization", |b| {
        b.iter(|| serde_json::to_string_pretty(&buttons).expect("Should serialize"))
    });

    c.bench_function("buttons_json_deserialization", |b| {
        b.iter(|| serde_json::from_str::<Vec<RelayButton>>(&json).expect("Should deserialize"))
    });
}

criterion_group!(benches, bench_reconcile, bench_button_serialization);
criterion_main!(benches);
