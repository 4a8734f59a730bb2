//! Search benchmarks.
//!
//! Run with: `cargo bench -p xq-mcts`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use games_skirmish::{start_board, SkirmishRules};
use xq_mcts::{SearchConfig, SearchEngine, SearchRequest, UniformEvaluator, ZobristHasher};
use xq_core::GameRules;

fn bench_search_simulations(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_simulations");

    for sims in [64u32, 256, 1024] {
        group.throughput(Throughput::Elements(sims as u64));
        group.bench_with_input(BenchmarkId::new("skirmish", sims), &sims, |b, &sims| {
            let config = SearchConfig::for_testing()
                .with_simulations(sims)
                .with_workers(4);
            b.iter_batched(
                || SearchEngine::new(SkirmishRules, UniformEvaluator::new(), config.clone()).unwrap(),
                |mut engine| {
                    engine
                        .search(SearchRequest::new(start_board(), 0))
                        .unwrap()
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_worker_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("worker_scaling");

    for workers in [1usize, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("workers", workers),
            &workers,
            |b, &workers| {
                let config = SearchConfig::for_testing()
                    .with_simulations(256)
                    .with_workers(workers);
                b.iter_batched(
                    || {
                        SearchEngine::new(SkirmishRules, UniformEvaluator::new(), config.clone())
                            .unwrap()
                    },
                    |mut engine| {
                        engine
                            .search(SearchRequest::new(start_board(), 0))
                            .unwrap()
                    },
                    criterion::BatchSize::LargeInput,
                );
            },
        );
    }

    group.finish();
}

fn bench_zobrist(c: &mut Criterion) {
    let hasher = ZobristHasher::new();
    let rules = SkirmishRules;
    let board = start_board();
    let moves = rules.legal_moves(&board);
    let base = hasher.hash(&board);

    c.bench_function("zobrist_full_hash", |b| b.iter(|| hasher.hash(&board)));

    c.bench_function("zobrist_incremental_update", |b| {
        b.iter(|| {
            let mut h = base;
            for &mv in &moves {
                let moved = board.piece_at(mv.from).unwrap();
                h ^= hasher.update(base, mv, moved, board.piece_at(mv.to));
            }
            h
        })
    });
}

criterion_group!(
    benches,
    bench_search_simulations,
    bench_worker_scaling,
    bench_zobrist
);
criterion_main!(benches);
