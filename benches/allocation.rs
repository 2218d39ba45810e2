use std::collections::BTreeSet;
use std::hint::black_box;

use coach_booking::models::{initial_state, SeatId, SeatState, UserId};
use coach_booking::services::{book, find_contiguous_block};
use criterion::{criterion_group, criterion_main, Criterion};

fn fragmented_state() -> SeatState {
    // Заняты все места с чётным номером: блоков длиннее 1 нет
    let even: BTreeSet<SeatId> = (1..=80).filter(|id| id % 2 == 0).collect();
    book(&initial_state(), &even, &UserId::from("bench@example.com")).expect("free seats")
}

fn bench_find_contiguous_block(c: &mut Criterion) {
    let empty = initial_state();
    let fragmented = fragmented_state();

    let mut group = c.benchmark_group("find_contiguous_block");
    group.bench_function("empty_coach_count_7", |b| {
        b.iter(|| find_contiguous_block(black_box(&empty), black_box(7)))
    });
    group.bench_function("fragmented_coach_count_2", |b| {
        b.iter(|| find_contiguous_block(black_box(&fragmented), black_box(2)))
    });
    group.finish();
}

criterion_group!(benches, bench_find_contiguous_block);
criterion_main!(benches);
