use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use basalt::board::Position;
use basalt::eval::nnue::{AccumulatorStack, Network};
use basalt::search::time::TimeManager;
use basalt::search::tt::TT;
use basalt::search::Worker;

fn fixed_depth_search(c: &mut Criterion) {
    let p = Position::from_fen(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    )
    .unwrap();
    let net = Arc::new(Network::seeded_default());
    let stop = Arc::new(AtomicBool::new(false));
    // worker id 1 keeps the per-depth info lines out of the bench output
    let counters: Arc<Vec<AtomicU64>> =
        Arc::new(vec![AtomicU64::new(0), AtomicU64::new(0)]);

    c.bench_function("search kiwipete d6", |b| {
        b.iter(|| {
            // fresh table each run so iterations do not feed each other
            let tt = Arc::new(TT::new(8));
            let mut worker = Worker::new(1, tt, stop.clone(), counters.clone(), net.clone());
            stop.store(false, Ordering::Relaxed);
            worker.set_root(p, &[p.key]);
            worker.prepare(TimeManager::fixed_depth(6));
            worker.iterate()
        })
    });
}

fn nnue_evaluation(c: &mut Criterion) {
    let p = Position::from_fen(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    )
    .unwrap();
    let net = Network::seeded_default();
    let mut accs = AccumulatorStack::new();

    c.bench_function("nnue full refresh eval", |b| {
        b.iter(|| {
            accs.reset(&p, &net);
            basalt::eval::evaluate(&p, &net, &mut accs)
        })
    });
}

criterion_group!(benches, fixed_depth_search, nnue_evaluation);
criterion_main!(benches);
