//! Performance benchmarks for the scan hot path.
//!
//! Every decoded frame and tag read passes through token validation and the
//! arbitration gate; every admitted scan through classification. The optical
//! channel can emit one event per tick for as long as a code is held up, so
//! these paths must stay well under a microsecond.
//!
//! # Run Benchmarks
//!
//! ```sh
//! # Run all gate benchmarks
//! cargo bench --bench gate_bench
//!
//! # Run a specific group
//! cargo bench --bench gate_bench -- gate_admission
//!
//! # Compare against a saved baseline
//! cargo bench --bench gate_bench -- --save-baseline main
//! cargo bench --bench gate_bench -- --baseline main
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rollcall_core::{
    Channel, DirectoryEntry, EntityId, EntityKind, ScanEvent, ScanState, Token,
};
use rollcall_kiosk::{ArbitrationGate, classify};
use std::hint::black_box;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Benchmark token construction from raw channel input.
fn bench_token_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("token_validation");
    group.throughput(Throughput::Elements(1));

    let test_cases = vec![
        ("optical", "qr_011"),
        ("radio", "nfc_04A1B2C3D4E5F6"),
        ("manual_padded", "  A1B2C3 \n"),
        ("max_length", "X".repeat(128).leak() as &str),
        ("blank", "   "),
    ];

    for (name, raw) in test_cases {
        group.bench_with_input(BenchmarkId::new("new", name), &raw, |b, &raw| {
            b.iter(|| black_box(Token::new(black_box(raw))));
        });
    }

    group.finish();
}

/// Benchmark gate decisions for a burst of scans.
///
/// A code held in front of the camera produces one event per tick; all but
/// the first fall inside the debounce window.
fn bench_gate_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("gate_admission");

    for burst in [1usize, 10, 100] {
        group.throughput(Throughput::Elements(burst as u64));

        let base = Instant::now();
        let events: Vec<ScanEvent> = (0..burst)
            .map(|i| {
                let channel = Channel::ALL[i % Channel::ALL.len()];
                ScanEvent::observed(
                    Token::new("qr_011").unwrap(),
                    channel,
                    base + Duration::from_millis(i as u64 * 100),
                )
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("ready", burst), &events, |b, events| {
            let (_state_tx, state_rx) = watch::channel(ScanState::Ready);
            b.iter(|| {
                let mut gate = ArbitrationGate::new(state_rx.clone(), Duration::from_millis(500));
                let admitted = events.iter().filter(|e| gate.admit(e)).count();
                black_box(admitted)
            });
        });

        group.bench_with_input(
            BenchmarkId::new("processing", burst),
            &events,
            |b, events| {
                let (_state_tx, state_rx) = watch::channel(ScanState::Processing);
                b.iter(|| {
                    let mut gate =
                        ArbitrationGate::new(state_rx.clone(), Duration::from_millis(500));
                    let admitted = events.iter().filter(|e| gate.admit(e)).count();
                    black_box(admitted)
                });
            },
        );
    }

    group.finish();
}

/// Benchmark classification of directory entries.
fn bench_classification(c: &mut Criterion) {
    let mut group = c.benchmark_group("classification");
    group.throughput(Throughput::Elements(1));

    let token = Token::new("qr_011").unwrap();
    let student = DirectoryEntry::active(token.clone(), EntityKind::Student, EntityId::new(11));
    let teacher = DirectoryEntry::active(token.clone(), EntityKind::Teacher, EntityId::new(7));
    let revoked = teacher.clone().revoked();

    let scenarios = vec![
        ("unknown", None),
        ("student", Some(student)),
        ("teacher", Some(teacher)),
        ("revoked", Some(revoked)),
    ];

    for (name, entry) in scenarios {
        group.bench_function(name, |b| {
            b.iter(|| black_box(classify(black_box(entry.as_ref()))));
        });
    }

    group.finish();
}

/// Benchmark constant-time token comparison.
fn bench_token_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("token_comparison");
    group.throughput(Throughput::Elements(1));

    let a = Token::new("nfc_04A1B2C3D4E5F6").unwrap();
    let same = a.clone();
    let prefix_match = Token::new("nfc_04A1B2C3D4E5F7").unwrap();
    let early_mismatch = Token::new("qr_04A1B2C3D4E5F6X").unwrap();

    group.bench_function("equal", |b| b.iter(|| black_box(&a) == black_box(&same)));
    group.bench_function("late_mismatch", |b| {
        b.iter(|| black_box(&a) == black_box(&prefix_match))
    });
    group.bench_function("early_mismatch", |b| {
        b.iter(|| black_box(&a) == black_box(&early_mismatch))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_token_validation,
    bench_gate_admission,
    bench_classification,
    bench_token_comparison
);
criterion_main!(benches);
