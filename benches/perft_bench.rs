use criterion::{black_box, criterion_group, criterion_main, Criterion};

use basalt::board::Position;
use basalt::perft::perft;

fn perft_startpos(c: &mut Criterion) {
    let p = Position::startpos();
    c.bench_function("perft startpos d4", |b| {
        b.iter(|| perft(black_box(&p), 4))
    });
}

fn perft_kiwipete(c: &mut Criterion) {
    let p = Position::from_fen(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    )
    .unwrap();
    c.bench_function("perft kiwipete d3", |b| {
        b.iter(|| perft(black_box(&p), 3))
    });
}

criterion_group!(benches, perft_startpos, perft_kiwipete);
criterion_main!(benches);
